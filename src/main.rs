use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rekordbox_prep::backfill::{scan_audio_files, MetadataBackfill};
use rekordbox_prep::config::Settings;
use rekordbox_prep::downloader::{Downloader, DownloaderOptions};
use rekordbox_prep::essentia::EssentiaExtractor;
use rekordbox_prep::quality::{format_duration, DEFAULT_MIN_DURATION};
use rekordbox_prep::spotify::{extract_playlists, load_backup, write_track_list};
use rekordbox_prep::tagging::LoftyTagWriter;
use rekordbox_prep::track::read_song_list;
use rekordbox_prep::youtube::YtDlp;
use rekordbox_prep::Error;

const PREVIEW_LEN: usize = 10;

#[derive(Parser)]
#[command(name = "rekordbox-prep")]
#[command(about = "Turn Spotify playlists into a tagged mp3 library for Rekordbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extracts playlists from a Spotify backup JSON into an "Artist - Title" list
    Extract {
        /// Spotify backup export (e.g. you@2025_11_13.json)
        backup: PathBuf,
        /// Playlist names to extract
        #[arg(default_values_t = ["HOUSE".to_string(), "POP".to_string()])]
        playlists: Vec<String>,
        /// Output text file
        #[arg(short, long, default_value = "spotify_extracted.txt")]
        output: PathBuf,
    },
    /// Downloads every "Artist - Title" line of a list as mp3
    Download {
        /// Text file with one "Artist - Title" per line
        song_list: PathBuf,
        /// Minimum accepted duration in seconds
        #[arg(default_value_t = DEFAULT_MIN_DURATION)]
        min_duration: u64,
        /// Put every download in this folder instead of one folder per artist
        main_folder: Option<String>,
        /// Library root (defaults to $REKORDBOX_OUTPUT_DIR or rekordbox_music)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Detects KEY and BPM for existing mp3 files and writes them into the tags
    Backfill {
        /// Folder with mp3 files (e.g. rekordbox_music/HOUSE)
        directory: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let result = match cli.command {
        Commands::Extract {
            backup,
            playlists,
            output,
        } => handle_extract(backup, playlists, output),
        Commands::Download {
            song_list,
            min_duration,
            main_folder,
            output_dir,
        } => handle_download(&settings, song_list, min_duration, main_folder, output_dir).await,
        Commands::Backfill { directory } => handle_backfill(&settings, directory).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Aborting");
        eprintln!("Error: {}", e);
        if let Error::ToolMissing(tool) = e {
            eprintln!("Install it with: pip install {}", tool);
        }
        process::exit(1);
    }
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}", "=".repeat(60));
}

fn handle_extract(backup: PathBuf, playlists: Vec<String>, output: PathBuf) -> Result<(), Error> {
    banner("Extracting Spotify playlists");

    let document = load_backup(&backup)?;
    let extraction = extract_playlists(&document, &playlists);
    for (name, count) in &extraction.playlist_counts {
        println!("  {}: {} songs", name, count);
    }

    write_track_list(&output, &playlists, &extraction.tracks)?;

    println!();
    banner("Summary");
    for (name, count) in &extraction.playlist_counts {
        println!("  {}: {} songs", name, count);
    }
    println!("\n  Unique total: {} songs", extraction.tracks.len());
    println!("  Output file: {}", output.display());

    println!();
    banner(&format!("First {} songs", PREVIEW_LEN));
    for (i, track) in extraction.tracks.iter().take(PREVIEW_LEN).enumerate() {
        println!("  {}. {}", i + 1, track);
    }
    if extraction.tracks.len() > PREVIEW_LEN {
        println!("  ... and {} more", extraction.tracks.len() - PREVIEW_LEN);
    }

    println!("\nTo download: rekordbox-prep download {}", output.display());
    Ok(())
}

async fn handle_download(
    settings: &Settings,
    song_list: PathBuf,
    min_duration: u64,
    main_folder: Option<String>,
    output_dir: Option<PathBuf>,
) -> Result<(), Error> {
    let songs = read_song_list(&song_list)?;
    if songs.is_empty() {
        println!("No valid songs found in {}", song_list.display());
        return Ok(());
    }

    let ytdlp = YtDlp::locate(settings.ytdlp_path.as_deref(), settings.timeouts)?;
    let analyzer = EssentiaExtractor::locate(settings.essentia_path.as_deref(), settings.timeouts.analysis);
    if !analyzer.is_available() {
        tracing::warn!("essentia extractor not found, KEY/BPM detection disabled");
    }

    let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    fs::create_dir_all(&output_dir)?;
    let output_dir = fs::canonicalize(&output_dir).unwrap_or(output_dir);

    let downloader = Downloader::new(
        ytdlp,
        analyzer,
        LoftyTagWriter::new(settings.timeouts.tag_write),
        DownloaderOptions {
            output_dir: output_dir.clone(),
            min_duration,
            main_folder,
        },
    );

    banner("YouTube to Rekordbox mp3 downloader");
    println!("Total songs: {}", songs.len());
    println!("Output directory: {}", output_dir.display());
    println!("Minimum duration: {}", format_duration(min_duration));
    println!("Filters: unreleased, live, concert, tour, duration < {}", format_duration(min_duration));
    println!("{}", "=".repeat(60));

    let report = downloader.run(&songs).await;

    println!();
    banner("Download summary");
    println!("Total processed: {}", report.total);
    println!("✓ Successful: {}", report.succeeded());
    println!("⊘ Skipped: {}", report.skipped.len());
    println!("✗ Failed: {}", report.failed.len());

    if !report.skipped.is_empty() {
        println!("\n⊘ Skipped songs:");
        for (song, reason) in &report.skipped {
            println!("   - {} ({})", song, reason);
        }
    }

    if !report.failed.is_empty() {
        println!("\n✗ Failed songs:");
        for (song, error) in &report.failed {
            println!("   - {} ({})", song, error);
        }
    }

    println!("\nSongs saved in: {}", output_dir.display());
    println!("Next step: import the folder into Rekordbox");
    Ok(())
}

async fn handle_backfill(settings: &Settings, directory: PathBuf) -> Result<(), Error> {
    let files = scan_audio_files(&directory)?;
    if files.is_empty() {
        println!("No MP3 files found in {}", directory.display());
        return Ok(());
    }

    let analyzer = EssentiaExtractor::locate(settings.essentia_path.as_deref(), settings.timeouts.analysis);
    if !analyzer.is_available() {
        tracing::warn!("essentia extractor not found, nothing can be detected");
    }

    banner(&format!("Processing: {}", directory.display()));
    println!("  Total files: {}", files.len());

    let backfill = MetadataBackfill::new(analyzer, LoftyTagWriter::new(settings.timeouts.tag_write));
    let report = backfill.run(&files).await;

    println!();
    banner(&format!("Summary: {}", directory.display()));
    println!("  Updated: {}/{}", report.updated.len(), report.total);
    println!("  Failed: {}/{}", report.failed.len(), report.total);
    for (path, failure) in &report.failed {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("   - {} ({})", name, failure);
    }
    Ok(())
}
