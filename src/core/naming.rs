use std::path::{Path, PathBuf};

use crate::models::Track;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Make one path component safe on every platform the download tool runs on.
///
/// Reserved characters and control codes become `_`; trailing dots and spaces
/// are dropped because Windows strips them silently.
pub fn sanitize_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim_end_matches(['.', ' ']).to_string()
}

/// `"{artist} - {title}"`, sanitized. Tracks without a known artist use "Unknown Artist".
pub fn file_stem(track: &Track) -> String {
    let artist = match track.artist.known().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => UNKNOWN_ARTIST,
    };
    format!(
        "{} - {}",
        sanitize_component(artist),
        sanitize_component(track.title.trim())
    )
}

/// Output template for the download tool; `%(ext)s` is filled in by the tool.
/// A literal `%` in the stem is doubled so the tool does not read it as a field.
pub fn output_template(dir: &Path, track: &Track) -> String {
    let dir = dir.to_string_lossy().replace('%', "%%");
    let name = format!("{}.%(ext)s", file_stem(track).replace('%', "%%"));
    Path::new(&dir).join(name).to_string_lossy().into_owned()
}

/// Where the tool writes the file after converting to `audio_format`.
pub fn expected_path(dir: &Path, track: &Track, audio_format: &str) -> PathBuf {
    dir.join(format!("{}.{}", file_stem(track), audio_format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artist;

    fn track(title: &str, artist: Artist) -> Track {
        Track {
            index: 1,
            title: title.to_string(),
            artist,
            track_id: Some(1),
            url: "https://music.163.com/song?id=1".to_string(),
        }
    }

    #[test]
    fn test_sanitize_reserved_characters() {
        assert_eq!(sanitize_component("a/b\0c"), "a_b_c");
        assert_eq!(sanitize_component("What? <Live>: \"1|2\""), "What_ _Live__ _1_2_");
        assert_eq!(sanitize_component("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_trailing_dots_and_spaces() {
        assert_eq!(sanitize_component("Wait... "), "Wait");
    }

    #[test]
    fn test_sanitize_keeps_cjk() {
        assert_eq!(sanitize_component("周杰伦 - 晴天"), "周杰伦 - 晴天");
    }

    #[test]
    fn test_percent_is_escaped_only_in_template() {
        let dir = Path::new("downloads");
        let t = track("100% Pure", Artist::Known("X".to_string()));
        assert!(output_template(dir, &t).ends_with("X - 100%% Pure.%(ext)s"));
        assert_eq!(expected_path(dir, &t, "mp3"), dir.join("X - 100% Pure.mp3"));
    }

    #[test]
    fn test_file_stem_known_artist() {
        let t = track("Back in Black", Artist::Known("AC/DC".to_string()));
        assert_eq!(file_stem(&t), "AC_DC - Back in Black");
    }

    #[test]
    fn test_file_stem_without_artist() {
        assert_eq!(file_stem(&track("A", Artist::Unresolved)), "Unknown Artist - A");
        assert_eq!(file_stem(&track("A", Artist::Unknown)), "Unknown Artist - A");
        assert_eq!(
            file_stem(&track("A", Artist::Known(" ".to_string()))),
            "Unknown Artist - A"
        );
    }

    #[test]
    fn test_output_template_and_expected_path() {
        let dir = Path::new("downloads");
        let t = track("A", Artist::Known("X".to_string()));
        assert_eq!(
            output_template(dir, &t),
            Path::new("downloads").join("X - A.%(ext)s").to_string_lossy()
        );
        assert_eq!(expected_path(dir, &t, "mp3"), dir.join("X - A.mp3"));
    }
}
