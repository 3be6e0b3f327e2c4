//! Writing key and tempo into audio file tags, backed by `lofty`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::read_from_path;
use lofty::tag::{ItemKey, Tag};

use crate::error::ToolError;

#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn write(&self, path: &Path, key: Option<&str>, bpm: Option<u32>) -> Result<(), ToolError>;
}

/// In-place tag editor. For MP3 files the key lands in `TKEY` and the
/// tempo in `TBPM`.
#[derive(Debug, Clone)]
pub struct LoftyTagWriter {
    timeout: Duration,
}

impl LoftyTagWriter {
    pub fn new(timeout: Duration) -> Self {
        LoftyTagWriter { timeout }
    }
}

fn write_tags(path: &Path, key: Option<&str>, bpm: Option<u32>) -> Result<(), String> {
    let mut tagged_file = read_from_path(path).map_err(|e| format!("Failed to read tags: {e}"))?;
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    let tag = tagged_file
        .tag_mut(tag_type)
        .ok_or_else(|| format!("No writable tag available for {:?}", tag_type))?;

    if let Some(key) = key {
        tag.insert_text(ItemKey::InitialKey, key.to_string());
    }
    if let Some(bpm) = bpm {
        tag.remove_key(ItemKey::Bpm);
        tag.insert_text(ItemKey::IntegerBpm, bpm.to_string());
    }

    tagged_file
        .save_to_path(path, WriteOptions::default())
        .map_err(|e| format!("Failed to write tags: {e}"))
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write(&self, path: &Path, key: Option<&str>, bpm: Option<u32>) -> Result<(), ToolError> {
        if key.is_none() && bpm.is_none() {
            return Ok(());
        }

        let owned_path: PathBuf = path.to_path_buf();
        let owned_key = key.map(str::to_string);
        let task = tokio::task::spawn_blocking(move || {
            write_tags(&owned_path, owned_key.as_deref(), bpm)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result.map_err(ToolError::Tag),
            Ok(Err(join_error)) => Err(ToolError::Tag(format!("Task join error: {join_error}"))),
            Err(_) => Err(ToolError::Timeout {
                tool: "tag writer",
                secs: self.timeout.as_secs(),
            }),
        }?;

        tracing::debug!(file = %path.display(), ?key, ?bpm, "Tags written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nothing_to_write_is_a_no_op() {
        let writer = LoftyTagWriter::new(Duration::from_secs(1));
        writer
            .write(Path::new("/nonexistent/song.mp3"), None, None)
            .await
            .unwrap();
    }

    /// Silent MPEG-1 Layer III frames (128 kbps, 44.1 kHz), no tags.
    fn silent_mp3(frames: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(frames * 417);
        for _ in 0..frames {
            data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
            data.extend(std::iter::repeat(0u8).take(413));
        }
        data
    }

    #[tokio::test]
    async fn writes_key_and_bpm_into_untagged_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untagged.mp3");
        std::fs::write(&path, silent_mp3(20)).unwrap();

        let writer = LoftyTagWriter::new(Duration::from_secs(5));
        writer.write(&path, Some("8A"), Some(124)).await.unwrap();

        let tagged_file = read_from_path(&path).unwrap();
        let tag = tagged_file.primary_tag().unwrap();
        assert_eq!(tag.get_string(ItemKey::InitialKey), Some("8A"));
        assert_eq!(tag.get_string(ItemKey::IntegerBpm), Some("124"));
    }

    #[tokio::test]
    async fn tempo_only_leaves_key_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, silent_mp3(20)).unwrap();

        let writer = LoftyTagWriter::new(Duration::from_secs(5));
        writer.write(&path, Some("5A"), None).await.unwrap();
        writer.write(&path, None, Some(98)).await.unwrap();

        let tagged_file = read_from_path(&path).unwrap();
        let tag = tagged_file.primary_tag().unwrap();
        assert_eq!(tag.get_string(ItemKey::InitialKey), Some("5A"));
        assert_eq!(tag.get_string(ItemKey::IntegerBpm), Some("98"));
    }

    #[tokio::test]
    async fn missing_file_is_a_tag_error() {
        let writer = LoftyTagWriter::new(Duration::from_secs(5));
        let err = writer
            .write(Path::new("/nonexistent/song.mp3"), Some("8A"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Tag(_)));
    }
}
