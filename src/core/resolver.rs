use crate::core::identifier::PlaylistId;
use crate::error::FetchError;
use crate::models::{Track, TrackEntry, TrackOrigin};
use crate::sources::{PlaylistSource, TierOutcome};

/// A tier that could not answer, kept for reporting.
#[derive(Debug)]
pub struct TierFailure {
    pub tier: &'static str,
    pub error: FetchError,
}

/// Final product of one resolution run.
#[derive(Debug, Default)]
pub struct Resolution {
    pub tracks: Vec<Track>,
    /// `None` when every tier failed.
    pub origin: Option<TrackOrigin>,
    pub failures: Vec<TierFailure>,
}

impl Resolution {
    /// No tracks resolvable; not an error.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

enum State {
    TryEndpoint,
    TryMarkup,
    Done { origin: Option<TrackOrigin>, entries: Vec<TrackEntry> },
}

/// Runs endpoint then markup, one attempt each. The first tier that answers
/// wins entirely; indices are assigned here, 1..=N in answer order.
pub fn resolve(
    endpoint: &dyn PlaylistSource,
    markup: &dyn PlaylistSource,
    id: &PlaylistId,
) -> Resolution {
    let mut failures = Vec::new();
    let mut state = State::TryEndpoint;

    loop {
        state = match state {
            State::TryEndpoint => match endpoint.fetch(id) {
                TierOutcome::Resolved { origin, entries } => State::Done {
                    origin: Some(origin),
                    entries,
                },
                TierOutcome::Unavailable(error) => {
                    tracing::warn!(tier = endpoint.name(), %error, "tier failed, falling back");
                    failures.push(TierFailure { tier: endpoint.name(), error });
                    State::TryMarkup
                }
            },
            State::TryMarkup => match markup.fetch(id) {
                TierOutcome::Resolved { origin, entries } => State::Done {
                    origin: Some(origin),
                    entries,
                },
                TierOutcome::Unavailable(error) => {
                    tracing::warn!(tier = markup.name(), %error, "last tier failed");
                    failures.push(TierFailure { tier: markup.name(), error });
                    State::Done {
                        origin: None,
                        entries: Vec::new(),
                    }
                }
            },
            State::Done { origin, entries } => {
                let tracks = entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, entry)| entry.into_track(i + 1))
                    .collect();
                return Resolution {
                    tracks,
                    origin,
                    failures,
                };
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::models::Artist;
    use crate::sources::endpoint::EndpointSource;
    use crate::sources::markup::MarkupSource;
    use crate::sources::session::test_session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    enum Script {
        Answer(TrackOrigin, Vec<TrackEntry>),
        Fail,
    }

    struct FakeTier {
        name: &'static str,
        script: RefCell<Option<Script>>,
        calls: Cell<usize>,
    }

    impl FakeTier {
        fn new(name: &'static str, script: Script) -> Self {
            Self {
                name,
                script: RefCell::new(Some(script)),
                calls: Cell::new(0),
            }
        }
    }

    impl PlaylistSource for FakeTier {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch(&self, _id: &PlaylistId) -> TierOutcome {
            self.calls.set(self.calls.get() + 1);
            match self.script.borrow_mut().take().expect("tier called twice") {
                Script::Answer(origin, entries) => TierOutcome::Resolved { origin, entries },
                Script::Fail => TierOutcome::Unavailable(FetchError::Malformed("scripted".to_string())),
            }
        }
    }

    fn entry(title: &str, artist: Artist, id: Option<u64>) -> TrackEntry {
        TrackEntry {
            title: title.to_string(),
            artist,
            track_id: id,
            url: format!("https://music.163.com/song?id={}", id.unwrap_or(0)),
        }
    }

    fn id() -> PlaylistId {
        PlaylistId::parse("2619366284").unwrap()
    }

    #[test]
    fn test_endpoint_success_skips_markup() {
        let endpoint = FakeTier::new(
            "endpoint",
            Script::Answer(
                TrackOrigin::Endpoint,
                vec![
                    entry("A", Artist::Known("X".into()), Some(1)),
                    entry("B", Artist::Known("Y".into()), Some(2)),
                    entry("C", Artist::Known("Z".into()), Some(3)),
                ],
            ),
        );
        let markup = FakeTier::new("markup", Script::Fail);

        let resolution = resolve(&endpoint, &markup, &id());

        assert_eq!(markup.calls.get(), 0);
        assert_eq!(resolution.origin, Some(TrackOrigin::Endpoint));
        let indices: Vec<usize> = resolution.tracks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(resolution.tracks[1].title, "B");
        assert!(resolution.failures.is_empty());
    }

    #[test]
    fn test_empty_endpoint_answer_is_terminal() {
        let endpoint = FakeTier::new("endpoint", Script::Answer(TrackOrigin::Endpoint, Vec::new()));
        let markup = FakeTier::new("markup", Script::Fail);

        let resolution = resolve(&endpoint, &markup, &id());

        assert_eq!(markup.calls.get(), 0);
        assert!(resolution.is_empty());
        assert_eq!(resolution.origin, Some(TrackOrigin::Endpoint));
    }

    #[test]
    fn test_endpoint_failure_uses_markup_once() {
        let endpoint = FakeTier::new("endpoint", Script::Fail);
        let markup = FakeTier::new(
            "markup",
            Script::Answer(
                TrackOrigin::LinkList,
                vec![
                    entry("A", Artist::Unresolved, Some(10)),
                    entry("B", Artist::Unresolved, None),
                ],
            ),
        );

        let resolution = resolve(&endpoint, &markup, &id());

        assert_eq!(endpoint.calls.get(), 1);
        assert_eq!(markup.calls.get(), 1);
        assert_eq!(resolution.origin, Some(TrackOrigin::LinkList));
        assert_eq!(resolution.tracks.len(), 2);
        assert_eq!(resolution.tracks[1].index, 2);
        assert_eq!(resolution.tracks[1].track_id, None);
        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].tier, "endpoint");
    }

    #[test]
    fn test_markup_empty_answer_is_final() {
        let endpoint = FakeTier::new("endpoint", Script::Fail);
        let markup = FakeTier::new("markup", Script::Answer(TrackOrigin::NoMatch, Vec::new()));

        let resolution = resolve(&endpoint, &markup, &id());

        assert_eq!(markup.calls.get(), 1);
        assert!(resolution.is_empty());
        assert_eq!(resolution.origin, Some(TrackOrigin::NoMatch));
    }

    #[test]
    fn test_both_tiers_failing_yields_empty() {
        let endpoint = FakeTier::new("endpoint", Script::Fail);
        let markup = FakeTier::new("markup", Script::Fail);

        let resolution = resolve(&endpoint, &markup, &id());

        assert!(resolution.is_empty());
        assert_eq!(resolution.origin, None);
        assert_eq!(resolution.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_endpoint_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playlist/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code":200,"result":{"tracks":[{"id":1,"name":"A","artists":[{"name":"X"}]},{"id":2,"name":"B","artists":[{"name":"Y"}]}]}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlist"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let base = server.uri();
        let (resolution, base) = tokio::task::spawn_blocking(move || {
            let session = test_session(&base);
            let resolution = resolve(
                &EndpointSource::new(&session),
                &MarkupSource::new(&session),
                &id(),
            );
            (resolution, base)
        })
        .await
        .unwrap();

        let expected = vec![
            Track {
                index: 1,
                title: "A".to_string(),
                artist: Artist::Known("X".to_string()),
                track_id: Some(1),
                url: format!("{}/song?id=1", base),
            },
            Track {
                index: 2,
                title: "B".to_string(),
                artist: Artist::Known("Y".to_string()),
                track_id: Some(2),
                url: format!("{}/song?id=2", base),
            },
        ];
        assert_eq!(resolution.tracks, expected);
    }

    #[tokio::test]
    async fn test_scenario_404_and_bare_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playlist/detail"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlist"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let resolution = tokio::task::spawn_blocking(move || {
            let session = test_session(&base);
            resolve(&EndpointSource::new(&session), &MarkupSource::new(&session), &id())
        })
        .await
        .unwrap();

        assert!(resolution.is_empty());
        assert_eq!(resolution.origin, Some(TrackOrigin::NoMatch));
        assert_eq!(resolution.failures.len(), 1);
    }
}
