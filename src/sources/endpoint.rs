use serde::Deserialize;

use crate::core::identifier::PlaylistId;
use crate::error::FetchError;
use crate::models::{Artist, TrackEntry, TrackOrigin};
use crate::sources::session::Session;
use crate::sources::{PlaylistSource, TierOutcome};

const SUCCESS_CODE: i64 = 200;

/// Structured-data tier: `GET {base}/api/playlist/detail?id={id}`.
pub struct EndpointSource<'a> {
    session: &'a Session,
}

#[derive(Deserialize)]
struct DetailEnvelope {
    code: Option<i64>,
    msg: Option<String>,
    result: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct DetailResult {
    tracks: Vec<ApiTrack>,
}

#[derive(Deserialize)]
struct ApiTrack {
    id: u64,
    name: String,
    artists: Vec<ApiArtist>,
}

#[derive(Deserialize)]
struct ApiArtist {
    name: String,
}

impl<'a> EndpointSource<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn request(&self, id: &PlaylistId) -> Result<Vec<TrackEntry>, FetchError> {
        let url = self.session.endpoint_url(id);
        tracing::info!(%url, "requesting playlist detail");

        let response = self.session.client().get(&url).send()?;
        let status = response.status();
        tracing::debug!(%status, "playlist detail response");
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes()?;
        parse_detail(&body, self.session).inspect_err(|e| {
            tracing::debug!(
                error = %e,
                preview = %String::from_utf8_lossy(&body[..body.len().min(500)]),
                "unexpected playlist detail payload"
            );
        })
    }
}

impl PlaylistSource for EndpointSource<'_> {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn fetch(&self, id: &PlaylistId) -> TierOutcome {
        match self.request(id) {
            Ok(entries) => TierOutcome::Resolved {
                origin: TrackOrigin::Endpoint,
                entries,
            },
            Err(e) => TierOutcome::Unavailable(e),
        }
    }
}

/// Parses a detail payload. Any malformed track element rejects the whole payload.
fn parse_detail(body: &[u8], session: &Session) -> Result<Vec<TrackEntry>, FetchError> {
    let envelope: DetailEnvelope = serde_json::from_slice(body)?;

    if envelope.code != Some(SUCCESS_CODE) {
        return Err(FetchError::Malformed(format!(
            "status code {:?} ({})",
            envelope.code,
            envelope.msg.as_deref().unwrap_or("no message")
        )));
    }

    let result = envelope
        .result
        .filter(|r| r.get("tracks").is_some())
        .ok_or_else(|| FetchError::Malformed("missing result.tracks".to_string()))?;
    let result = DetailResult::deserialize(result)?;

    Ok(result
        .tracks
        .into_iter()
        .map(|track| TrackEntry {
            url: session.song_url(track.id),
            artist: Artist::from_names(track.artists.iter().map(|a| a.name.as_str())),
            track_id: Some(track.id),
            title: track.name,
        })
        .collect())
}
