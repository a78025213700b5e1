use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::config::DownloadConfig;
use crate::core::{naming, tagger};
use crate::error::DownloadError;
use crate::models::Track;

/// Options for one download run.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub program: String,
    pub output_dir: PathBuf,
    pub audio_format: String,
    pub audio_quality: String,
    pub retries: u32,
    pub pause: Duration,
    pub tag_files: bool,
    /// Passed as `--cookies` when set.
    pub cookie_file: Option<PathBuf>,
}

impl DownloadOptions {
    /// The cookie file is only forwarded when it exists.
    pub fn from_config(cfg: &DownloadConfig, cookie_file: &Path) -> Self {
        Self {
            program: cfg.program.clone(),
            output_dir: cfg.output_dir.clone(),
            audio_format: cfg.audio_format.clone(),
            audio_quality: cfg.audio_quality.clone(),
            retries: cfg.retries,
            pause: Duration::from_millis(cfg.pause_ms),
            tag_files: cfg.tag_files,
            cookie_file: cookie_file.exists().then(|| cookie_file.to_path_buf()),
        }
    }
}

/// Known failure causes recognised in the tool's stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureHint {
    UnsupportedUrl,
    StreamBlocked,
}

impl FailureHint {
    pub fn message(&self) -> &'static str {
        match self {
            FailureHint::UnsupportedUrl => "the download tool does not support this link directly",
            FailureHint::StreamBlocked => {
                "the audio stream could not be extracted (encryption or licensing restrictions)"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackDownload {
    Completed,
    Failed {
        code: Option<i32>,
        hint: Option<FailureHint>,
        detail: String,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Locate the download tool and return its version string.
pub fn ensure_available(program: &str) -> Result<String, DownloadError> {
    let unavailable = |reason: String| DownloadError::ToolUnavailable {
        program: program.to_string(),
        reason,
    };

    let path = which::which(program).map_err(|e| unavailable(e.to_string()))?;
    let output = Command::new(&path)
        .arg("--version")
        .output()
        .map_err(|e| unavailable(e.to_string()))?;
    if !output.status.success() {
        return Err(unavailable(format!("--version exited with {}", output.status)));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    tracing::info!(path = %path.display(), %version, "download tool found");
    Ok(version)
}

pub fn build_args(track: &Track, opts: &DownloadOptions) -> Vec<String> {
    let mut args = vec![
        track.url.clone(),
        "-o".to_string(),
        naming::output_template(&opts.output_dir, track),
        "--extract-audio".to_string(),
        "--audio-format".to_string(),
        opts.audio_format.clone(),
        "--audio-quality".to_string(),
        opts.audio_quality.clone(),
        "--retries".to_string(),
        opts.retries.to_string(),
    ];
    if let Some(ref cookies) = opts.cookie_file {
        args.push("--cookies".to_string());
        args.push(cookies.to_string_lossy().into_owned());
    }
    args
}

pub fn classify_failure(stderr: &str) -> Option<FailureHint> {
    if stderr.contains("ERROR: This URL is not supported") {
        Some(FailureHint::UnsupportedUrl)
    } else if stderr.contains("WARNING: [netease]") {
        Some(FailureHint::StreamBlocked)
    } else {
        None
    }
}

/// Runs the tool for one track. Never returns an error; failures are recorded.
pub fn download_track(track: &Track, opts: &DownloadOptions) -> TrackDownload {
    let args = build_args(track, opts);
    tracing::debug!(program = %opts.program, ?args, "running download tool");

    let output = match Command::new(&opts.program).args(&args).output() {
        Ok(output) => output,
        Err(e) => {
            return TrackDownload::Failed {
                code: None,
                hint: None,
                detail: e.to_string(),
            }
        }
    };

    if output.status.success() {
        if opts.tag_files {
            tag_downloaded(track, opts);
        }
        return TrackDownload::Completed;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    TrackDownload::Failed {
        code: output.status.code(),
        hint: classify_failure(&stderr),
        detail: stderr.lines().last().unwrap_or_default().to_string(),
    }
}

fn tag_downloaded(track: &Track, opts: &DownloadOptions) {
    if !opts.audio_format.eq_ignore_ascii_case("mp3") {
        return;
    }
    let path = naming::expected_path(&opts.output_dir, track, &opts.audio_format);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "downloaded file not found, skipping tags");
        return;
    }
    if let Err(e) = tagger::write_tags(&path, track) {
        tracing::warn!(path = %path.display(), error = %e, "failed to tag downloaded file");
    }
}

/// Download every track, one at a time with a pause in between.
///
/// `on_result` is called after each track with its outcome.
pub fn download_all<F>(
    tracks: &[Track],
    opts: &DownloadOptions,
    mut on_result: F,
) -> Result<DownloadSummary, DownloadError>
where
    F: FnMut(&Track, &TrackDownload),
{
    ensure_available(&opts.program)?;
    std::fs::create_dir_all(&opts.output_dir)?;

    let mut summary = DownloadSummary::default();
    for (i, track) in tracks.iter().enumerate() {
        if i > 0 && !opts.pause.is_zero() {
            std::thread::sleep(opts.pause);
        }

        let result = download_track(track, opts);
        match result {
            TrackDownload::Completed => summary.completed += 1,
            TrackDownload::Failed { .. } => summary.failed += 1,
        }
        on_result(track, &result);
    }

    Ok(summary)
}
