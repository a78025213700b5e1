pub mod endpoint;
pub mod markup;
pub mod session;

use crate::core::identifier::PlaylistId;
use crate::error::FetchError;
use crate::models::{TrackEntry, TrackOrigin};

/// Result of one resolution tier.
#[derive(Debug)]
pub enum TierOutcome {
    /// The tier answered; its list is final even when empty.
    Resolved {
        origin: TrackOrigin,
        entries: Vec<TrackEntry>,
    },
    /// The tier could not answer; the resolver moves on.
    Unavailable(FetchError),
}

/// A playlist resolution tier.
/// The structured endpoint and the playlist page both sit behind this trait,
/// so the resolver can be exercised with fakes.
pub trait PlaylistSource {
    fn name(&self) -> &'static str;
    /// Makes exactly one attempt for `id`. Never panics on bad data.
    fn fetch(&self, id: &PlaylistId) -> TierOutcome;
}
