#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rekordbox_prep::essentia::{Analysis, Analyzer};
use rekordbox_prep::tagging::TagWriter;
use rekordbox_prep::youtube::{Candidate, MediaSource};
use rekordbox_prep::{SongQuery, ToolError};

pub fn candidate(title: &str, duration: u64) -> Candidate {
    Candidate {
        id: format!("id-{}", title.len()),
        title: title.to_string(),
        duration,
        uploader: "uploader".to_string(),
    }
}

/// Serves canned lookup results; unknown queries fail like an empty search.
/// Clones share their call records.
#[derive(Clone, Default)]
pub struct FakeSource {
    pub candidates: HashMap<String, Candidate>,
    pub failing_fetches: Vec<String>,
    pub lookups: Arc<Mutex<Vec<String>>>,
    pub fetches: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl FakeSource {
    pub fn with(mut self, song: &SongQuery, candidate: Candidate) -> Self {
        self.candidates.insert(song.search_query(), candidate);
        self
    }

    pub fn failing_fetch(mut self, song: &SongQuery) -> Self {
        self.failing_fetches.push(song.search_query());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<(String, PathBuf)> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn lookup(&self, query: &str) -> Result<Candidate, ToolError> {
        self.lookups.lock().unwrap().push(query.to_string());
        self.candidates
            .get(query)
            .cloned()
            .ok_or_else(|| ToolError::Parse {
                tool: "yt-dlp",
                reason: "no results".to_string(),
            })
    }

    async fn fetch(
        &self,
        query: &str,
        song: &SongQuery,
        target_dir: &Path,
    ) -> Result<Option<PathBuf>, ToolError> {
        self.fetches
            .lock()
            .unwrap()
            .push((query.to_string(), target_dir.to_path_buf()));

        if self.failing_fetches.iter().any(|q| q == query) {
            return Err(ToolError::Failed {
                tool: "yt-dlp",
                status: "exit status: 1".to_string(),
                stderr: "ERROR: unable to download".to_string(),
            });
        }

        // Like yt-dlp, an existing file is left alone and reported as is.
        let file = target_dir.join(format!("{}.mp3", song.title));
        if !file.exists() {
            fs::write(&file, b"ID3").unwrap();
        }
        Ok(Some(file))
    }
}

/// Returns the same analysis for every file, or reports itself unavailable.
pub struct FakeAnalyzer {
    pub result: Option<Analysis>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl FakeAnalyzer {
    pub fn detecting(key: Option<&str>, bpm: Option<u32>) -> Self {
        FakeAnalyzer {
            result: Some(Analysis {
                key: key.map(str::to_string),
                bpm,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        FakeAnalyzer {
            result: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, path: &Path) -> Result<Analysis, ToolError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        self.result.clone().ok_or(ToolError::Unavailable {
            tool: "essentia_streaming_extractor_music",
        })
    }
}

/// Records writes; fails them all when `fail` is set.
#[derive(Clone, Default)]
pub struct FakeTagger {
    pub fail: bool,
    pub writes: Arc<Mutex<Vec<(PathBuf, Option<String>, Option<u32>)>>>,
}

impl FakeTagger {
    pub fn failing() -> Self {
        FakeTagger {
            fail: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<(PathBuf, Option<String>, Option<u32>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagWriter for FakeTagger {
    async fn write(&self, path: &Path, key: Option<&str>, bpm: Option<u32>) -> Result<(), ToolError> {
        if self.fail {
            return Err(ToolError::Tag("Failed to read tags: not an mpeg file".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), key.map(str::to_string), bpm));
        Ok(())
    }
}
