use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use crate::config::{self, Config};
use crate::core::cookies::{self, CredentialSet};
use crate::core::downloader::{self, DownloadOptions, TrackDownload};
use crate::core::identifier::PlaylistId;
use crate::core::report;
use crate::core::resolver::{self, Resolution};
use crate::error::{CredentialError, DownloadError};
use crate::models::Track;
use crate::sources::endpoint::EndpointSource;
use crate::sources::markup::MarkupSource;
use crate::sources::session::Session;

#[derive(Parser)]
#[command(name = "playlist-crawler", about = "Export a music playlist's track list and optionally download it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a playlist, write the report and optionally download the tracks
    Fetch(FetchArgs),
    /// Edit the saved defaults
    Config,
}

#[derive(Args, Default)]
pub struct FetchArgs {
    /// Playlist URL or numeric id (prompted for when omitted)
    pub input: Option<String>,
    /// Netscape-format cookie file
    #[arg(long)]
    pub cookies: Option<PathBuf>,
    /// Report file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Download without asking
    #[arg(long, conflicts_with = "no_download")]
    pub download: bool,
    /// Never download
    #[arg(long)]
    pub no_download: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Fetch(args)) => cmd_fetch(args),
        Some(Commands::Config) => cmd_config(),
        None => cmd_fetch(FetchArgs::default()),
    }
}

fn cmd_fetch(args: FetchArgs) -> Result<()> {
    let mut cfg = config::load_config();
    if let Some(cookies) = args.cookies {
        cfg.paths.cookie_file = cookies;
    }
    if let Some(output) = args.output {
        cfg.paths.report_file = output;
    }

    let input = match args.input {
        Some(input) => input,
        None => Input::<String>::new()
            .with_prompt("Playlist URL or id")
            .interact_text()?,
    };

    let id = PlaylistId::parse(&input)?;
    println!("Playlist id: {}", id);

    let credentials = load_credentials(&cfg);
    let session = Session::new(&cfg.provider, &credentials)?;

    let resolution = resolver::resolve(
        &EndpointSource::new(&session),
        &MarkupSource::new(&session),
        &id,
    );

    if resolution.is_empty() {
        print_no_tracks(&resolution);
        return Ok(());
    }

    print_tracks(&resolution);

    report::write_report(&cfg.paths.report_file, &resolution.tracks)?;
    println!("Report saved to {}", cfg.paths.report_file.display());

    let download = if args.download {
        true
    } else if args.no_download {
        false
    } else {
        println!("\nDownloading needs '{}' installed on this system.", cfg.download.program);
        Confirm::new()
            .with_prompt("Try to download all tracks now?")
            .default(false)
            .interact()?
    };

    if download {
        run_downloads(&cfg, &resolution.tracks);
    }

    Ok(())
}

fn load_credentials(cfg: &Config) -> CredentialSet {
    let path = &cfg.paths.cookie_file;
    match cookies::load_credentials(path) {
        Ok(set) if set.is_empty() => {
            println!("{} holds no cookies, continuing as a guest.", path.display());
            set
        }
        Ok(set) => {
            println!("Loaded {} cookies from {}", set.len(), path.display());
            set
        }
        Err(CredentialError::Missing(_)) => {
            tracing::warn!(path = %path.display(), "cookie file not found, continuing without login");
            println!("Note: {} not found, continuing as a guest.", path.display());
            println!("Private playlists need a cookie file exported after logging in, e.g.:");
            println!("  # Netscape HTTP Cookie File");
            println!("  .music.163.com\tTRUE\t/\tFALSE\t0\tMUSIC_U\tyour_value_here");
            CredentialSet::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cookies ignored");
            println!("Cookies ignored: {}", e);
            println!("Check that the file is Netscape format and UTF-8 encoded.");
            CredentialSet::default()
        }
    }
}

fn print_tracks(resolution: &Resolution) {
    if let Some(origin) = resolution.origin {
        println!("\nResolved via {}", origin.describe());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Title", "Artist", "ID", "URL"]);
    for track in &resolution.tracks {
        table.add_row(vec![
            Cell::new(track.index),
            Cell::new(&track.title),
            Cell::new(track.artist.display()),
            Cell::new(track.track_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::new(&track.url),
        ]);
    }

    println!("{table}");
    println!("\nFound {} songs", resolution.tracks.len());
}

fn print_no_tracks(resolution: &Resolution) {
    println!("\nFound 0 songs");
    for failure in &resolution.failures {
        println!("  {} tier: {}", failure.tier, failure.error);
    }
    println!("\nSuggestions:");
    println!("1. Make sure the playlist id is correct.");
    println!("2. Private playlists need a cookie file with a valid login (MUSIC_U).");
    println!("3. Check your network connection or try again later.");
}

fn run_downloads(cfg: &Config, tracks: &[Track]) {
    let opts = DownloadOptions::from_config(&cfg.download, &cfg.paths.cookie_file);
    if opts.cookie_file.is_none() {
        println!("Cookie file not found, downloads may be limited.");
    }
    let total = tracks.len();

    let result = downloader::download_all(tracks, &opts, |track, outcome| {
        let line = format!("[{}/{}] {}", track.index, total, track.summary());
        match outcome {
            TrackDownload::Completed => {
                println!("{}: saved to {}", line, opts.output_dir.display());
            }
            TrackDownload::Failed { code, hint, detail } => {
                let code = code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string());
                println!("{}: failed (exit code {})", line, code);
                match hint {
                    Some(hint) => println!("    hint: {}", hint.message()),
                    None if !detail.is_empty() => println!("    {}", detail),
                    None => {}
                }
            }
        }
    });

    match result {
        Ok(summary) => println!(
            "\nDownloads finished: {} succeeded, {} failed",
            summary.completed, summary.failed
        ),
        Err(DownloadError::ToolUnavailable { program, reason }) => {
            println!("\nCannot run '{}': {}", program, reason);
            println!("Install it (e.g. `pip install yt-dlp`) and make sure it is on PATH.");
        }
        Err(e) => println!("\nDownloads skipped: {}", e),
    }
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("playlist-crawler settings\n");

    let cookie_file: String = Input::new()
        .with_prompt("Cookie file")
        .with_initial_text(cfg.paths.cookie_file.to_string_lossy())
        .interact_text()?;

    let report_file: String = Input::new()
        .with_prompt("Report file")
        .with_initial_text(cfg.paths.report_file.to_string_lossy())
        .interact_text()?;

    let output_dir: String = Input::new()
        .with_prompt("Download directory")
        .with_initial_text(cfg.download.output_dir.to_string_lossy())
        .interact_text()?;

    let program: String = Input::new()
        .with_prompt("Download tool")
        .with_initial_text(cfg.download.program.as_str())
        .interact_text()?;

    cfg.paths.cookie_file = PathBuf::from(cookie_file);
    cfg.paths.report_file = PathBuf::from(report_file);
    cfg.download.output_dir = PathBuf::from(output_dir);
    cfg.download.program = program;

    let path = config::save_config(&cfg).context("failed to save settings")?;
    println!("\nSettings saved to {}", path.display());
    Ok(())
}
