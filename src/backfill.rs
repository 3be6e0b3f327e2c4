use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::downloader::is_mp3;
use crate::error::{Error, Result, ToolError};
use crate::essentia::{Analysis, Analyzer};
use crate::tagging::TagWriter;

#[derive(Debug)]
pub enum BackfillFailure {
    /// Neither key nor tempo was found. Carries the analyzer error, if any.
    NotDetected(Option<ToolError>),
    TagWrite(ToolError),
}

impl fmt::Display for BackfillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackfillFailure::NotDetected(None) => write!(f, "nothing detected"),
            BackfillFailure::NotDetected(Some(e)) => write!(f, "nothing detected ({})", e),
            BackfillFailure::TagWrite(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Default)]
pub struct BackfillReport {
    pub total: usize,
    pub updated: Vec<(PathBuf, Analysis)>,
    pub failed: Vec<(PathBuf, BackfillFailure)>,
}

/// Lists the mp3 files directly inside `dir`, sorted by name.
pub fn scan_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_mp3(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct MetadataBackfill<A, T> {
    analyzer: A,
    tagger: T,
}

impl<A, T> MetadataBackfill<A, T>
where
    A: Analyzer,
    T: TagWriter,
{
    pub fn new(analyzer: A, tagger: T) -> Self {
        MetadataBackfill { analyzer, tagger }
    }

    pub async fn process_file(
        &self,
        path: &Path,
        index: usize,
        total: usize,
    ) -> std::result::Result<Analysis, BackfillFailure> {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("\n[{}/{}] {}", index, total, name);

        let (analysis, analyzer_error) = match self.analyzer.analyze(path).await {
            Ok(analysis) => (analysis, None),
            Err(e) => {
                tracing::info!(file = %path.display(), error = %e, "Analysis failed");
                (Analysis::default(), Some(e))
            }
        };

        match &analysis.key {
            Some(key) => println!("    KEY: ✓ {}", key),
            None => println!("    KEY: ✗ not detected"),
        }
        match analysis.bpm {
            Some(bpm) => println!("    BPM: ✓ {}", bpm),
            None => println!("    BPM: ✗ not detected"),
        }

        if analysis.is_empty() {
            return Err(BackfillFailure::NotDetected(analyzer_error));
        }

        match self
            .tagger
            .write(path, analysis.key.as_deref(), analysis.bpm)
            .await
        {
            Ok(()) => {
                println!("    Metadata updated ✓");
                Ok(analysis)
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Could not write tags");
                println!("    Metadata update ✗");
                Err(BackfillFailure::TagWrite(e))
            }
        }
    }

    pub async fn run(&self, files: &[PathBuf]) -> BackfillReport {
        let mut report = BackfillReport {
            total: files.len(),
            ..Default::default()
        };

        for (i, path) in files.iter().enumerate() {
            match self.process_file(path, i + 1, files.len()).await {
                Ok(analysis) => report.updated.push((path.clone(), analysis)),
                Err(failure) => report.failed.push((path.clone(), failure)),
            }
        }

        tracing::info!(
            total = report.total,
            updated = report.updated.len(),
            failed = report.failed.len(),
            "Backfill finished"
        );
        report
    }
}
