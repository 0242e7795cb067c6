//! VibeStore trait definition.
//!
//! The ranking core only reads through `query_events_in_box`; the remaining
//! operations serve ingestion and housekeeping.

use anyhow::Result;

use super::models::{EventRow, StoreCounts, VibeEvent, VibeReport};
use crate::geo::BoundingBox;

pub trait VibeStore: Send + Sync {
    /// Record one play. Genre, artist, track and location are upserted on
    /// their stable keys; the (location, track) event is created with a play
    /// count of 1 or has its count incremented and `last_seen` refreshed.
    fn record_vibe(&self, report: &VibeReport, seen_at: i64) -> Result<VibeEvent>;

    /// All events located inside `bbox` (half-open, see `BoundingBox::contains`)
    /// with `last_seen` strictly greater than `seen_after`.
    fn query_events_in_box(&self, bbox: &BoundingBox, seen_after: i64) -> Result<Vec<EventRow>>;

    /// Delete events last seen before `cutoff`. Returns the number removed.
    fn prune_events_older_than(&self, cutoff: i64) -> Result<usize>;

    fn get_counts(&self) -> Result<StoreCounts>;
}
