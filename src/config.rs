use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://music.163.com".to_string(),
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub cookie_file: PathBuf,
    pub report_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from("cookies.txt"),
            report_file: PathBuf::from("songs.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub program: String,
    pub output_dir: PathBuf,
    pub audio_format: String,
    pub audio_quality: String,
    /// Passed through to the download tool.
    pub retries: u32,
    pub pause_ms: u64,
    pub tag_files: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            output_dir: PathBuf::from("Netease_Downloads"),
            audio_format: "mp3".to_string(),
            audio_quality: "0".to_string(),
            retries: 5,
            pause_ms: 500,
            tag_files: true,
        }
    }
}

/// `PLAYLIST_CRAWLER_CONFIG` overrides the platform config directory.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("PLAYLIST_CRAWLER_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playlist-crawler")
        .join("config.toml")
}

pub fn load_config() -> Config {
    load_from(&config_path())
}

fn load_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
            Config::default()
        }
    }
}

fn parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config invalid, using defaults");
        Config::default()
    })
}

pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_path();
    save_to(&path, config)?;
    Ok(path)
}

fn save_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("cannot serialize settings")?;
    std::fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = parse_config(
            r#"
            [download]
            retries = 2
            "#,
        );
        assert_eq!(cfg.download.retries, 2);
        assert_eq!(cfg.download.program, "yt-dlp");
        assert_eq!(cfg.provider.base_url, "https://music.163.com");
        assert_eq!(cfg.paths.report_file, PathBuf::from("songs.txt"));
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let cfg = parse_config("provider = 3");
        assert_eq!(cfg.provider.timeout_secs, 15);
    }

    #[test]
    fn test_saved_settings_are_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.paths.cookie_file = PathBuf::from("/tmp/c.txt");
        cfg.download.program = "yt-dlp-nightly".to_string();
        save_to(&path, &cfg).unwrap();

        let back = load_from(&path);
        assert_eq!(back.paths.cookie_file, PathBuf::from("/tmp/c.txt"));
        assert_eq!(back.download.program, "yt-dlp-nightly");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("absent.toml"));
        assert_eq!(cfg.download.output_dir, PathBuf::from("Netease_Downloads"));
    }
}
