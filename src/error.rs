use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a whole run before any item is processed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),
    #[error("Directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Required tool '{0}' is not installed")]
    ToolMissing(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid backup document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single external call. Recorded against the item and never
/// propagated past it.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} is not available")]
    Unavailable { tool: &'static str },
    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: &'static str, secs: u64 },
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("could not parse {tool} output: {reason}")]
    Parse { tool: &'static str, reason: String },
    #[error("{tool} scratch space unavailable: {source}")]
    Io {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("tag write failed: {0}")]
    Tag(String),
    #[error("could not create {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
