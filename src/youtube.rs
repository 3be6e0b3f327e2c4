//! Media lookup and download through `yt-dlp`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::config::Timeouts;
use crate::error::{Error, ToolError};
use crate::process::run_with_timeout;
use crate::track::SongQuery;

pub const YTDLP: &str = "yt-dlp";
const VENV_YTDLP: &str = "venv/bin/yt-dlp";

/// The best match a lookup returned for a search string.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    /// Seconds; 0 when the source did not report it.
    pub duration: u64,
    pub uploader: String,
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Candidate, ToolError>;

    /// Downloads the match for `query` as an mp3 into `target_dir` and
    /// returns the written file when the source reports it.
    async fn fetch(
        &self,
        query: &str,
        song: &SongQuery,
        target_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError>;
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    uploader: Option<String>,
}

impl From<VideoInfo> for Candidate {
    fn from(info: VideoInfo) -> Self {
        Candidate {
            id: info.id,
            title: info.title,
            duration: info
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d as u64)
                .unwrap_or(0),
            uploader: info.uploader.unwrap_or_default(),
        }
    }
}

/// Parses `yt-dlp -j` output. Search queries print one JSON object per line;
/// only the first is used.
pub fn parse_candidate(stdout: &str) -> Result<Candidate, ToolError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ToolError::Parse {
            tool: YTDLP,
            reason: "no results".to_string(),
        })?;

    let info: VideoInfo = serde_json::from_str(line).map_err(|e| ToolError::Parse {
        tool: YTDLP,
        reason: e.to_string(),
    })?;

    Ok(info.into())
}

/// The final file path printed by `--print after_move:filepath`. Already
/// downloaded files are reported too.
pub fn parse_fetched_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    timeouts: Timeouts,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>, timeouts: Timeouts) -> Self {
        YtDlp {
            binary: binary.into(),
            timeouts,
        }
    }

    /// Finds the binary: an explicit path first, then a local virtualenv,
    /// then `PATH`.
    pub fn locate(configured: Option<&Path>, timeouts: Timeouts) -> Result<Self, Error> {
        let binary = match configured {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => which::which(path).ok(),
            None if Path::new(VENV_YTDLP).exists() => Some(PathBuf::from(VENV_YTDLP)),
            None => which::which(YTDLP).ok(),
        };

        match binary {
            Some(binary) => {
                tracing::debug!(binary = %binary.display(), "Using yt-dlp");
                Ok(YtDlp::new(binary, timeouts))
            }
            None => Err(Error::ToolMissing(YTDLP)),
        }
    }

    fn fetch_args(query: &str, song: &SongQuery, target_dir: &Path) -> Vec<String> {
        let template = target_dir.join("%(title)s.%(ext)s");
        vec![
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            "0".to_string(),
            "--embed-thumbnail".to_string(),
            "--add-metadata".to_string(),
            "--metadata-from-title".to_string(),
            "%(artist)s - %(title)s".to_string(),
            "--parse-metadata".to_string(),
            format!("title:{}", song.artist),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            query.to_string(),
        ]
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn lookup(&self, query: &str) -> Result<Candidate, ToolError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-j", "--no-playlist", query]);

        let output = run_with_timeout(cmd, YTDLP, self.timeouts.lookup).await?;
        parse_candidate(&String::from_utf8_lossy(&output.stdout))
    }

    async fn fetch(
        &self,
        query: &str,
        song: &SongQuery,
        target_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::fetch_args(query, song, target_dir));

        let output = run_with_timeout(cmd, YTDLP, self.timeouts.fetch).await?;
        Ok(parse_fetched_path(&String::from_utf8_lossy(&output.stdout)))
    }
}
