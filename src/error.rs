//! Error types for the crawler.
//!
//! Fetch errors never leave the resolver; they become a fallback transition or
//! an empty result. The remaining types surface to the CLI, which decides
//! whether they are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// The user input names no playlist.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("no playlist id found in {0:?} (expected a URL containing id=<digits> or a bare number)")]
    Invalid(String),
}

/// Why a resolution tier could not produce data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Body was not valid JSON for the expected shape.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Body parsed but lacked the success code or the track array.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cookie file {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("could not read cookie file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cookie file, line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The download tool cannot be invoked; only the download phase stops.
    #[error("download tool {program:?} is not available: {reason}")]
    ToolUnavailable { program: String, reason: String },

    #[error("could not prepare output directory: {0}")]
    Io(#[from] std::io::Error),
}
