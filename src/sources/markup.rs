use scraper::{Html, Selector};
use serde::Deserialize;
use url::{form_urlencoded, Url};

use crate::core::identifier::PlaylistId;
use crate::error::FetchError;
use crate::models::{Artist, TrackEntry, TrackOrigin};
use crate::sources::session::Session;
use crate::sources::{PlaylistSource, TierOutcome};

/// Markup tier: scrapes `GET {base}/playlist?id={id}`.
///
/// Two extraction strategies run in order:
/// 1. the `textarea#song-list-pre-data` JSON block,
/// 2. the hidden `ul.f-hide` list of song links.
///
/// A page with neither is a valid, empty answer.
pub struct MarkupSource<'a> {
    session: &'a Session,
}

#[derive(Deserialize)]
struct EmbeddedTrack {
    id: u64,
    name: String,
    artists: Option<Vec<EmbeddedArtist>>,
}

#[derive(Deserialize)]
struct EmbeddedArtist {
    name: String,
}

impl<'a> MarkupSource<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn request(&self, id: &PlaylistId) -> Result<String, FetchError> {
        let url = self.session.playlist_page_url(id);
        tracing::info!(%url, "requesting playlist page");

        let response = self.session.client().get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // UTF-8 regardless of the declared charset.
        let body = response.bytes()?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl PlaylistSource for MarkupSource<'_> {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn fetch(&self, id: &PlaylistId) -> TierOutcome {
        match self.request(id) {
            Ok(html) => {
                let (origin, entries) = extract_tracks(&html, self.session);
                TierOutcome::Resolved { origin, entries }
            }
            Err(e) => TierOutcome::Unavailable(e),
        }
    }
}

pub fn extract_tracks(html: &str, session: &Session) -> (TrackOrigin, Vec<TrackEntry>) {
    let document = Html::parse_document(html);

    let embedded = extract_embedded(&document, session);
    if !embedded.is_empty() {
        tracing::info!(count = embedded.len(), "tracks from embedded data block");
        return (TrackOrigin::EmbeddedData, embedded);
    }

    let links = extract_link_list(&document, session);
    if !links.is_empty() {
        tracing::info!(count = links.len(), "tracks from hidden link list");
        return (TrackOrigin::LinkList, links);
    }

    tracing::warn!("playlist page carries neither embedded data nor a link list");
    (TrackOrigin::NoMatch, Vec::new())
}

/// Strategy A. Missing, blank, unparsable or empty blocks all yield nothing.
fn extract_embedded(document: &Html, session: &Session) -> Vec<TrackEntry> {
    let block_sel = Selector::parse("textarea#song-list-pre-data").unwrap();

    let text = match document.select(&block_sel).next() {
        Some(el) => el.text().collect::<String>(),
        None => return Vec::new(),
    };
    if text.trim().is_empty() {
        return Vec::new();
    }

    let tracks: Vec<EmbeddedTrack> = match serde_json::from_str(text.trim()) {
        Ok(tracks) => tracks,
        Err(e) => {
            tracing::warn!(error = %e, "embedded data block is not a track array");
            return Vec::new();
        }
    };

    tracks
        .into_iter()
        .map(|track| TrackEntry {
            url: session.song_url(track.id),
            artist: match &track.artists {
                Some(artists) => Artist::from_names(artists.iter().map(|a| a.name.as_str())),
                None => Artist::Unknown,
            },
            track_id: Some(track.id),
            title: track.name,
        })
        .collect()
}

/// Strategy B. Artists are not present in the list.
fn extract_link_list(document: &Html, session: &Session) -> Vec<TrackEntry> {
    let link_sel = Selector::parse("ul.f-hide a[href]").unwrap();

    document
        .select(&link_sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let url = session.resolve_href(href)?;
            let track_id = song_target(&url)?;

            Some(TrackEntry {
                title: el.text().collect::<String>().trim().to_string(),
                artist: Artist::Unresolved,
                track_id,
                url: url.to_string(),
            })
        })
        .collect()
}

/// `Some(id)` when `url` points at a song page, either `/song?id=..` or the
/// hash route `/#/song?id=..`. The inner id is `None` when absent or not numeric.
fn song_target(url: &Url) -> Option<Option<u64>> {
    let query = if url.path().ends_with("/song") {
        url.query().unwrap_or_default()
    } else {
        let fragment = url.fragment()?;
        let (route, query) = fragment.split_once('?').unwrap_or((fragment, ""));
        if !route.ends_with("/song") {
            return None;
        }
        query
    };

    Some(
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "id")
            .and_then(|(_, v)| v.parse::<u64>().ok()),
    )
}
