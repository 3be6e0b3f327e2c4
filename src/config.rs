use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenv::dotenv;

pub const DEFAULT_OUTPUT_DIR: &str = "rekordbox_music";

/// Runtime settings, read from `.env` and the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ytdlp_path: Option<PathBuf>,
    pub essentia_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub timeouts: Timeouts,
}

/// Per-call limits for every external tool.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub lookup: Duration,
    pub fetch: Duration,
    pub analysis: Duration,
    pub tag_write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            lookup: Duration::from_secs(30),
            fetch: Duration::from_secs(300),
            analysis: Duration::from_secs(60),
            tag_write: Duration::from_secs(10),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Timeouts::default();
        let secs = |key: &str, default: Duration| match var(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => Duration::from_secs(value),
                _ => {
                    tracing::warn!(key, value = %raw, "Ignoring invalid timeout");
                    default
                }
            },
        };

        Settings {
            ytdlp_path: var("YTDLP_PATH").filter(|v| !v.is_empty()).map(PathBuf::from),
            essentia_path: var("ESSENTIA_EXTRACTOR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            output_dir: var("REKORDBOX_OUTPUT_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            timeouts: Timeouts {
                lookup: secs("LOOKUP_TIMEOUT_SECS", defaults.lookup),
                fetch: secs("FETCH_TIMEOUT_SECS", defaults.fetch),
                analysis: secs("ANALYSIS_TIMEOUT_SECS", defaults.analysis),
                tag_write: secs("TAG_TIMEOUT_SECS", defaults.tag_write),
            },
        }
    }
}
