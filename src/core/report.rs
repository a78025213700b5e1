use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::Track;

/// Render the text report: a count line, a rule, then one block per track.
pub fn render_report(tracks: &[Track]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} songs", tracks.len());
    let _ = writeln!(out, "{}", "=".repeat(60));
    out.push('\n');

    for track in tracks {
        let _ = writeln!(out, "[{}] {} - {}", track.index, track.title, track.artist);
        let _ = writeln!(out, "URL: {}", track.url);
        if let Some(id) = track.track_id {
            let _ = writeln!(out, "ID: {}", id);
        }
        out.push('\n');
    }

    out
}

/// Rewrites `path` with the report for `tracks`.
pub fn write_report(path: &Path, tracks: &[Track]) -> Result<()> {
    std::fs::write(path, render_report(tracks))
        .with_context(|| format!("failed to write report {}", path.display()))
}
