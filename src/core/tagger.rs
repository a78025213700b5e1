use std::path::Path;

use anyhow::Result;
use id3::{Tag, TagLike, Version};

use crate::models::Track;

/// Write playlist metadata into a downloaded file as ID3v2.4.
/// Existing frames written by the download tool are kept unless overwritten here.
pub fn write_tags(path: &Path, track: &Track) -> Result<()> {
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

    tag.set_title(&track.title);
    if let Some(artist) = track.artist.known().filter(|a| !a.is_empty()) {
        tag.set_artist(artist);
    }
    tag.set_track(u32::try_from(track.index)?);

    tag.write_to_path(path, Version::Id3v24)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artist;

    fn track(artist: Artist) -> Track {
        Track {
            index: 7,
            title: "Title".to_string(),
            artist,
            track_id: Some(1),
            url: "https://music.163.com/song?id=1".to_string(),
        }
    }

    #[test]
    fn test_writes_title_artist_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.mp3");
        std::fs::write(&path, b"").unwrap();

        write_tags(&path, &track(Artist::Known("X, Y".to_string()))).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Title"));
        assert_eq!(tag.artist(), Some("X, Y"));
        assert_eq!(tag.track(), Some(7));
    }

    #[test]
    fn test_sentinel_artist_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.mp3");
        std::fs::write(&path, b"").unwrap();

        write_tags(&path, &track(Artist::Unresolved)).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.artist(), None);
    }
}
