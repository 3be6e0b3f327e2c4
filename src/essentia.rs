//! Key and tempo detection with Essentia's music extractor.
//!
//! `essentia_streaming_extractor_music <input> <output.json>` writes a JSON
//! descriptor file; only the tonal and rhythm sections are read here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::process::Command;

use crate::camelot::to_camelot;
use crate::error::ToolError;
use crate::process::run_with_timeout;

pub const ESSENTIA: &str = "essentia_streaming_extractor_music";

/// What the analyzer found. Either field may be missing independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Camelot code, or the raw label when it has no Camelot equivalent.
    pub key: Option<String>,
    pub bpm: Option<u32>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.bpm.is_none()
    }
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, path: &Path) -> Result<Analysis, ToolError>;
}

#[derive(Debug, Default, Deserialize)]
struct ExtractorOutput {
    #[serde(default)]
    tonal: Option<Tonal>,
    #[serde(default)]
    rhythm: Option<Rhythm>,
}

#[derive(Debug, Default, Deserialize)]
struct Tonal {
    #[serde(default)]
    key_edma: Option<KeyEstimate>,
    #[serde(default)]
    key_krumhansl: Option<KeyEstimate>,
    // Extractors before 2.1 flatten the estimate into the tonal section.
    #[serde(default)]
    key_key: Option<String>,
    #[serde(default)]
    key_scale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyEstimate {
    key: String,
    scale: String,
}

#[derive(Debug, Default, Deserialize)]
struct Rhythm {
    #[serde(default)]
    bpm: Option<f64>,
}

impl ExtractorOutput {
    fn key_label(&self) -> Option<String> {
        let tonal = self.tonal.as_ref()?;
        let label = match (&tonal.key_edma, &tonal.key_krumhansl) {
            (Some(estimate), _) | (None, Some(estimate)) => {
                format!("{} {}", estimate.key, estimate.scale)
            }
            (None, None) => format!("{} {}", tonal.key_key.as_ref()?, tonal.key_scale.as_ref()?),
        };
        let label = label.trim().to_string();
        (!label.is_empty()).then_some(label)
    }

    fn bpm(&self) -> Option<u32> {
        self.rhythm
            .as_ref()?
            .bpm
            .filter(|bpm| bpm.is_finite() && *bpm >= 1.0)
            .map(|bpm| bpm as u32)
    }
}

/// Turns the extractor's JSON into an [`Analysis`], translating the key
/// to Camelot notation.
pub fn parse_analysis(json: &str) -> Result<Analysis, ToolError> {
    let output: ExtractorOutput = serde_json::from_str(json).map_err(|e| ToolError::Parse {
        tool: ESSENTIA,
        reason: e.to_string(),
    })?;

    Ok(Analysis {
        key: output.key_label().map(|label| to_camelot(&label).to_string()),
        bpm: output.bpm(),
    })
}

#[derive(Debug, Clone)]
pub struct EssentiaExtractor {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl EssentiaExtractor {
    /// Probes for the extractor once. A missing binary is not an error here;
    /// every later call reports [`ToolError::Unavailable`].
    pub fn locate(configured: Option<&Path>, timeout: Duration) -> Self {
        let binary = match configured {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => which::which(path).ok(),
            None => which::which(ESSENTIA).ok(),
        };

        tracing::debug!(
            command = ESSENTIA,
            available = binary.is_some(),
            "Essentia availability check"
        );

        EssentiaExtractor { binary, timeout }
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}

/// Private directory for the descriptor file, removed on drop.
fn scratch_dir_in(root: &Path) -> Result<TempDir, ToolError> {
    tempfile::Builder::new()
        .prefix("essentia-")
        .tempdir_in(root)
        .map_err(|source| ToolError::Io {
            tool: ESSENTIA,
            source,
        })
}

#[async_trait]
impl Analyzer for EssentiaExtractor {
    async fn analyze(&self, path: &Path) -> Result<Analysis, ToolError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or(ToolError::Unavailable { tool: ESSENTIA })?;

        let scratch = scratch_dir_in(&std::env::temp_dir())?;
        let output_path = scratch.path().join("descriptors.json");

        let mut cmd = Command::new(binary);
        cmd.arg(path).arg(&output_path);
        run_with_timeout(cmd, ESSENTIA, self.timeout).await?;

        let json = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|e| ToolError::Parse {
                tool: ESSENTIA,
                reason: format!("reading {}: {}", output_path.display(), e),
            })?;

        let analysis = parse_analysis(&json)?;
        tracing::debug!(
            file = %path.display(),
            key = ?analysis.key,
            bpm = ?analysis.bpm,
            "Essentia analysis completed"
        );
        Ok(analysis)
    }
}
