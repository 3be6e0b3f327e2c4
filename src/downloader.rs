//! Track list downloader: lookup, filter, fetch, analyze and tag, one song
//! at a time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::essentia::{Analysis, Analyzer};
use crate::quality::{format_duration, QualityFilter, SkipReason};
use crate::tagging::TagWriter;
use crate::track::{SongQuery, UNKNOWN_ARTIST};
use crate::youtube::MediaSource;

#[derive(Debug, Clone)]
pub struct DownloaderOptions {
    pub output_dir: PathBuf,
    pub min_duration: u64,
    /// Groups every download under one folder (e.g. `HOUSE`) instead of
    /// one folder per artist.
    pub main_folder: Option<String>,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Downloaded {
        file: Option<PathBuf>,
        analysis: Analysis,
    },
    Skipped(SkipReason),
    Failed(ToolError),
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub total: usize,
    /// Fetched songs with the file that was analyzed, when one was found.
    pub downloaded: Vec<(SongQuery, Option<PathBuf>, Analysis)>,
    pub skipped: Vec<(SongQuery, SkipReason)>,
    pub failed: Vec<(SongQuery, ToolError)>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> usize {
        self.downloaded.len()
    }

    fn record(&mut self, song: &SongQuery, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded { file, analysis } => {
                self.downloaded.push((song.clone(), file, analysis))
            }
            ItemOutcome::Skipped(reason) => self.skipped.push((song.clone(), reason)),
            ItemOutcome::Failed(error) => self.failed.push((song.clone(), error)),
        }
    }
}

/// Strips characters that are invalid in file names on common filesystems
/// and collapses runs of whitespace.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(*c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The most recently modified `.mp3` directly inside `dir`.
pub fn newest_mp3(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_mp3(path))
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path)
}

pub fn is_mp3(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

pub struct Downloader<S, A, T> {
    source: S,
    analyzer: A,
    tagger: T,
    filter: QualityFilter,
    options: DownloaderOptions,
}

impl<S, A, T> Downloader<S, A, T>
where
    S: MediaSource,
    A: Analyzer,
    T: TagWriter,
{
    pub fn new(source: S, analyzer: A, tagger: T, options: DownloaderOptions) -> Self {
        Downloader {
            source,
            analyzer,
            tagger,
            filter: QualityFilter::new(options.min_duration),
            options,
        }
    }

    pub fn target_dir(&self, song: &SongQuery) -> PathBuf {
        match &self.options.main_folder {
            Some(folder) => self.options.output_dir.join(folder),
            None => self.options.output_dir.join(artist_folder(&song.artist)),
        }
    }

    fn prepare_dir(&self, song: &SongQuery) -> Result<PathBuf, ToolError> {
        let dir = self.target_dir(song);
        let first_error = match fs::create_dir_all(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) => e,
        };

        if self.options.main_folder.is_some() {
            return Err(ToolError::Directory {
                path: dir,
                source: first_error,
            });
        }

        // Some filesystems (and symlinked music folders) reject '&'.
        tracing::warn!(dir = %dir.display(), error = %first_error, "Retrying folder without '&'");
        let fallback = self
            .options
            .output_dir
            .join(artist_folder(&song.artist).replace('&', "and"));
        fs::create_dir_all(&fallback).map_err(|source| ToolError::Directory {
            path: fallback.clone(),
            source,
        })?;
        Ok(fallback)
    }

    pub async fn download_song(&self, song: &SongQuery, index: usize, total: usize) -> ItemOutcome {
        println!("\n[{}/{}] Processing: {}", index, total, song);

        let dir = match self.prepare_dir(song) {
            Ok(dir) => dir,
            Err(e) => {
                println!("    ✗ {}", e);
                return ItemOutcome::Failed(e);
            }
        };
        println!("    Folder: {}", dir.display());

        let query = song.search_query();
        println!("    Searching...");
        let candidate = match self.source.lookup(&query).await {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::warn!(song = %song, error = %e, "Lookup failed");
                println!("    ✗ No match found");
                return ItemOutcome::Failed(e);
            }
        };

        tracing::debug!(
            id = %candidate.id,
            uploader = %candidate.uploader,
            duration = candidate.duration,
            "Candidate found"
        );

        if let Err(reason) = self.filter.check(&candidate.title, candidate.duration) {
            println!("    ⊘ SKIPPED: {}", reason);
            println!("    Title: {}", candidate.title);
            return ItemOutcome::Skipped(reason);
        }

        println!("    ✓ Title: {}", candidate.title);
        println!("    Duration: {}", format_duration(candidate.duration));
        println!("    Downloading...");

        let reported = match self.source.fetch(&query, song, &dir).await {
            Ok(reported) => reported,
            Err(e) => {
                tracing::warn!(song = %song, error = %e, "Download failed");
                println!("    ✗ Download failed: {}", e);
                return ItemOutcome::Failed(e);
            }
        };

        // A skipped re-download keeps its old mtime, so the reported path wins.
        let file = reported
            .filter(|path| is_mp3(path))
            .or_else(|| newest_mp3(&dir));
        let analysis = match &file {
            Some(file) => self.analyze_and_tag(file).await,
            None => {
                tracing::warn!(dir = %dir.display(), "No mp3 found after download");
                Analysis::default()
            }
        };

        println!("    ✓ Downloaded successfully");
        ItemOutcome::Downloaded { file, analysis }
    }

    /// Analysis and tagging never fail the item; problems are only reported.
    async fn analyze_and_tag(&self, file: &Path) -> Analysis {
        println!("    Detecting KEY/BPM...");
        let analysis = match self.analyzer.analyze(file).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::info!(file = %file.display(), error = %e, "Analysis unavailable");
                Analysis::default()
            }
        };

        if analysis.is_empty() {
            println!("    ℹ KEY/BPM not detected (requires essentia)");
            return analysis;
        }

        if let Some(key) = &analysis.key {
            println!("    KEY detected: {}", key);
        }
        if let Some(bpm) = analysis.bpm {
            println!("    BPM detected: {}", bpm);
        }

        if let Err(e) = self
            .tagger
            .write(file, analysis.key.as_deref(), analysis.bpm)
            .await
        {
            tracing::warn!(file = %file.display(), error = %e, "Could not write tags");
            println!("    ⚠ Tags not written: {}", e);
        }

        analysis
    }

    /// Processes every song in order. Repeated entries are downloaded again.
    pub async fn run(&self, songs: &[SongQuery]) -> DownloadReport {
        let mut report = DownloadReport {
            total: songs.len(),
            ..Default::default()
        };

        for (i, song) in songs.iter().enumerate() {
            let outcome = self.download_song(song, i + 1, songs.len()).await;
            report.record(song, outcome);
        }

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Download run finished"
        );
        report
    }
}

fn artist_folder(artist: &str) -> String {
    let name = sanitize_filename(artist);
    if name.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        name
    }
}
