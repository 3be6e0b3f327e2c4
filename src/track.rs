use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub const SEPARATOR: &str = " - ";
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// An (artist, title) pair, independent of any audio file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongQuery {
    pub artist: String,
    pub title: String,
}

impl SongQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        SongQuery {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Parses one line of a track list.
    ///
    /// Blank lines and `#` comments yield `None`. The line is split on the
    /// first `" - "` only, so an artist containing the separator ends up
    /// partly in the title.
    pub fn parse_line(line: &str) -> Option<SongQuery> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        match line.split_once(SEPARATOR) {
            Some((artist, title)) => Some(SongQuery::new(artist.trim(), title.trim())),
            None => Some(SongQuery::new(UNKNOWN_ARTIST, line)),
        }
    }

    /// Search string handed to the media lookup.
    pub fn search_query(&self) -> String {
        format!("ytsearch1:{} {} audio", self.artist, self.title)
    }
}

impl fmt::Display for SongQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.artist, SEPARATOR, self.title)
    }
}

/// Reads a track list, keeping input order and repeated lines.
pub fn read_song_list(path: &Path) -> Result<Vec<SongQuery>> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    Ok(content.lines().filter_map(SongQuery::parse_line).collect())
}
