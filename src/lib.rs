//! Building a DJ library from a Spotify backup: extract track lists,
//! download them as mp3 and tag them with Camelot key and BPM.

pub mod backfill;
pub mod camelot;
pub mod config;
pub mod downloader;
pub mod error;
pub mod essentia;
pub mod process;
pub mod quality;
pub mod spotify;
pub mod tagging;
pub mod track;
pub mod youtube;

pub use error::{Error, Result, ToolError};
pub use track::SongQuery;
