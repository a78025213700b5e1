use std::fmt;

/// Artist information as far as the answering tier could tell.
///
/// `Known("")` means the source listed no artists; `Unknown` and `Unresolved`
/// mean the source never carried the field at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artist {
    Known(String),
    /// Embedded data block without an artist array.
    Unknown,
    /// Link list entries; the artist needs a separate lookup.
    Unresolved,
}

impl Artist {
    /// Joins artist names with `", "`, keeping the source order.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Artist::Known(names.into_iter().collect::<Vec<_>>().join(", "))
    }

    pub fn known(&self) -> Option<&str> {
        match self {
            Artist::Known(name) => Some(name),
            _ => None,
        }
    }

    pub fn display(&self) -> &str {
        match self {
            Artist::Known(name) => name,
            Artist::Unknown => "Unknown artist",
            Artist::Unresolved => "Artist requires separate lookup",
        }
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Which tier (and which markup strategy) produced a track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOrigin {
    Endpoint,
    EmbeddedData,
    LinkList,
    /// The page loaded but carried neither known structure.
    NoMatch,
}

impl TrackOrigin {
    pub fn describe(&self) -> &'static str {
        match self {
            TrackOrigin::Endpoint => "structured endpoint",
            TrackOrigin::EmbeddedData => "embedded data block",
            TrackOrigin::LinkList => "hidden link list",
            TrackOrigin::NoMatch => "playlist page (no track data)",
        }
    }
}

/// A track as extracted by a tier, before the playlist position is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub title: String,
    pub artist: Artist,
    pub track_id: Option<u64>,
    pub url: String,
}

impl TrackEntry {
    pub fn into_track(self, index: usize) -> Track {
        Track {
            index,
            title: self.title,
            artist: self.artist,
            track_id: self.track_id,
            url: self.url,
        }
    }
}

/// One resolved playlist entry. `index` is 1-based and contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub index: usize,
    pub title: String,
    pub artist: Artist,
    pub track_id: Option<u64>,
    pub url: String,
}

impl Track {
    pub fn summary(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}
