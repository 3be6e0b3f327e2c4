use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::track::SongQuery;

/// A Spotify library backup export. Only the fields used here are modeled.
#[derive(Debug, Default, Deserialize)]
pub struct Backup {
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Playlist {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<BackupTrack>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackupTrack {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artist: String,
    #[serde(default, rename = "track", deserialize_with = "null_as_empty")]
    pub title: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default)]
pub struct Extraction {
    /// Unique `"Artist - Title"` lines in first-seen order.
    pub tracks: Vec<String>,
    /// Raw track count per matching playlist, in document order.
    pub playlist_counts: Vec<(String, usize)>,
}

pub fn load_backup(path: &Path) -> Result<Backup> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let backup = serde_json::from_reader(BufReader::new(file))?;
    Ok(backup)
}

/// Flattens the requested playlists into a deduplicated track list.
///
/// Counts are taken before invalid entries (empty artist or title) are
/// dropped. Requested names absent from the document are simply missing
/// from the counts.
pub fn extract_playlists(backup: &Backup, playlist_names: &[String]) -> Extraction {
    let mut extraction = Extraction::default();
    let mut seen = HashSet::new();

    for playlist in &backup.playlists {
        if !playlist_names.contains(&playlist.name) {
            continue;
        }

        let count = playlist.tracks.len();
        match extraction
            .playlist_counts
            .iter_mut()
            .find(|(name, _)| *name == playlist.name)
        {
            Some(entry) => entry.1 = count,
            None => extraction.playlist_counts.push((playlist.name.clone(), count)),
        }

        tracing::debug!(playlist = %playlist.name, tracks = count, "Extracting playlist");

        for track in &playlist.tracks {
            if track.artist.is_empty() || track.title.is_empty() {
                continue;
            }

            let line = SongQuery::new(track.artist.as_str(), track.title.as_str()).to_string();
            if seen.insert(line.clone()) {
                extraction.tracks.push(line);
            }
        }
    }

    extraction
}

pub fn write_track_list(path: &Path, playlist_names: &[String], tracks: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "# Spotify playlists: {}", playlist_names.join(", "))?;
    writeln!(writer, "# Total tracks: {}", tracks.len())?;
    writeln!(writer)?;

    for track in tracks {
        writeln!(writer, "{}", track)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::read_song_list;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_backup() -> Backup {
        let json = r#"{
            "playlists": [
                {"name": "HOUSE", "tracks": [
                    {"artist": "Daft Punk", "track": "One More Time", "album": "Discovery"},
                    {"artist": "Stardust", "track": "Music Sounds Better With You"},
                    {"artist": "", "track": "No Artist"},
                    {"artist": "No Title"}
                ]},
                {"name": "JAZZ", "tracks": [
                    {"artist": "Miles Davis", "track": "So What"}
                ]},
                {"name": "POP", "tracks": [
                    {"artist": "Robyn", "track": "Dancing On My Own"},
                    {"artist": "Daft Punk", "track": "One More Time"}
                ]}
            ]
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn filters_and_deduplicates() {
        let extraction = extract_playlists(&sample_backup(), &names(&["HOUSE", "POP"]));

        assert_eq!(
            extraction.tracks,
            vec![
                "Daft Punk - One More Time",
                "Stardust - Music Sounds Better With You",
                "Robyn - Dancing On My Own",
            ]
        );
        assert!(!extraction.tracks.iter().any(|t| t.contains("Miles Davis")));
    }

    #[test]
    fn large_backups_keep_first_seen_order() {
        let tracks: Vec<BackupTrack> = (0..20_000)
            .map(|i| BackupTrack {
                artist: format!("Artist {}", i % 5_000),
                title: format!("Title {}", i % 5_000),
            })
            .collect();
        let backup = Backup {
            playlists: vec![Playlist {
                name: "HOUSE".to_string(),
                tracks,
            }],
        };

        let extraction = extract_playlists(&backup, &names(&["HOUSE"]));
        assert_eq!(extraction.tracks.len(), 5_000);
        assert_eq!(extraction.tracks[0], "Artist 0 - Title 0");
        assert_eq!(extraction.tracks[4_999], "Artist 4999 - Title 4999");
        assert_eq!(extraction.playlist_counts, vec![("HOUSE".to_string(), 20_000)]);
    }

    #[test]
    fn counts_raw_entries_in_document_order() {
        let extraction = extract_playlists(&sample_backup(), &names(&["POP", "HOUSE", "TECHNO"]));

        assert_eq!(
            extraction.playlist_counts,
            vec![("HOUSE".to_string(), 4), ("POP".to_string(), 2)]
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let backup: Backup = serde_json::from_str(r#"{"playlists": [{"tracks": [{}]}, {"name": "POP"}]}"#).unwrap();
        let extraction = extract_playlists(&backup, &names(&["POP", ""]));

        assert!(extraction.tracks.is_empty());
        assert_eq!(
            extraction.playlist_counts,
            vec![(String::new(), 1), ("POP".to_string(), 0)]
        );

        let nulls: Backup =
            serde_json::from_str(r#"{"playlists": [{"name": "POP", "tracks": [{"artist": null, "track": "X"}]}]}"#)
                .unwrap();
        assert!(extract_playlists(&nulls, &names(&["POP"])).tracks.is_empty());

        let empty: Backup = serde_json::from_str("{}").unwrap();
        assert!(empty.playlists.is_empty());
    }

    #[test]
    fn writes_header_then_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("spotify_extracted.txt");
        let tracks = names(&["A - B", "C - D"]);

        write_track_list(&path, &names(&["HOUSE", "POP"]), &tracks).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "# Spotify playlists: HOUSE, POP\n# Total tracks: 2\n\nA - B\nC - D\n"
        );

        let songs = read_song_list(&path).unwrap();
        assert_eq!(songs, vec![SongQuery::new("A", "B"), SongQuery::new("C", "D")]);
    }

    #[test]
    fn missing_backup_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_backup(&dir.path().join("backup.json")).unwrap_err();
        assert!(matches!(err, Error::InputNotFound(_)));
    }

    #[test]
    fn malformed_backup_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_backup(&path).unwrap_err(), Error::Json(_)));
    }
}
