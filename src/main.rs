mod cli;
mod config;
mod core;
mod error;
mod models;
mod sources;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = cli::Cli::parse();

    let default_filter = match cli.verbose {
        0 => "playlist_crawler=warn",
        1 => "playlist_crawler=info",
        _ => "playlist_crawler=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
