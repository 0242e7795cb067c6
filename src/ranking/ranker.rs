//! Genre and track ranking over a single bounding box.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::models::{RankLimits, RankedGenre, RankedTrack, VibeRanking};
use crate::error::{VibeError, VibeResult};
use crate::geo::BoundingBox;
use crate::vibe_store::{EventRow, VibeStore};

/// Play count desc, then popularity desc, then most recent first.
/// External id breaks any remaining tie so output order is stable.
fn compare_tracks(a: &RankedTrack, b: &RankedTrack) -> Ordering {
    b.play_count
        .cmp(&a.play_count)
        .then_with(|| b.track.popularity.cmp(&a.track.popularity))
        .then_with(|| b.last_seen.cmp(&a.last_seen))
        .then_with(|| a.track.external_id.cmp(&b.track.external_id))
}

fn compare_genres(a: &RankedGenre, b: &RankedGenre) -> Ordering {
    b.genre_total_count
        .cmp(&a.genre_total_count)
        .then_with(|| b.genre_avg_popularity.total_cmp(&a.genre_avg_popularity))
        .then_with(|| a.genre.name.cmp(&b.genre.name))
}

fn truncate<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// Collapse per-location event rows into one entry per track, best first.
fn aggregate_tracks(rows: &[EventRow]) -> Vec<RankedTrack> {
    let mut by_track: HashMap<i64, RankedTrack> = HashMap::new();
    for row in rows {
        by_track
            .entry(row.track.id)
            .and_modify(|ranked| {
                ranked.play_count += row.play_count;
                ranked.last_seen = ranked.last_seen.max(row.last_seen);
            })
            .or_insert_with(|| RankedTrack {
                track: row.track.clone(),
                artist: row.artist.clone(),
                genre: row.genre.clone(),
                play_count: row.play_count,
                last_seen: row.last_seen,
            });
    }
    let mut tracks: Vec<RankedTrack> = by_track.into_values().collect();
    tracks.sort_by(compare_tracks);
    tracks
}

/// Build the genre list from already ranked tracks, skipping `OTHER_GENRE`.
fn aggregate_genres(ranked_tracks: &[RankedTrack]) -> Vec<RankedGenre> {
    let mut by_genre: HashMap<i64, Vec<&RankedTrack>> = HashMap::new();
    for ranked in ranked_tracks.iter().filter(|t| !t.genre.is_other()) {
        by_genre.entry(ranked.genre.id).or_default().push(ranked);
    }

    let mut genres: Vec<RankedGenre> = by_genre
        .into_values()
        .map(|tracks| {
            // Input is sorted, so the first track is the genre's best.
            let top_track = tracks[0].clone();
            let total: i64 = tracks.iter().map(|t| t.play_count).sum();
            let popularity_sum: i64 = tracks.iter().map(|t| t.track.popularity).sum();
            RankedGenre {
                genre: top_track.genre.clone(),
                genre_total_count: total,
                genre_avg_popularity: popularity_sum as f64 / tracks.len() as f64,
                top_track,
            }
        })
        .collect();
    genres.sort_by(compare_genres);
    genres
}

/// Rank already fetched event rows.
pub fn rank_rows(rows: &[EventRow], limits: &RankLimits) -> VibeRanking {
    let tracks = aggregate_tracks(rows);
    let genres = aggregate_genres(&tracks);
    VibeRanking {
        genres: truncate(genres, limits.genres),
        tracks: truncate(tracks, limits.tracks),
    }
}

#[derive(Clone)]
pub struct VibeRanker {
    store: Arc<dyn VibeStore>,
}

impl VibeRanker {
    pub fn new(store: Arc<dyn VibeStore>) -> Self {
        VibeRanker { store }
    }

    pub fn rank(
        &self,
        bbox: &BoundingBox,
        window: Duration,
        limits: &RankLimits,
    ) -> VibeResult<VibeRanking> {
        self.rank_at(bbox, window, limits, chrono::Utc::now().timestamp_millis())
    }

    /// Rank as of `now` (epoch millis). Events last seen at or before
    /// `now - window` are ignored.
    pub fn rank_at(
        &self,
        bbox: &BoundingBox,
        window: Duration,
        limits: &RankLimits,
        now: i64,
    ) -> VibeResult<VibeRanking> {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let seen_after = now.saturating_sub(window_ms);

        let rows = self
            .store
            .query_events_in_box(bbox, seen_after)
            .map_err(VibeError::StoreUnavailable)?;
        let ranking = rank_rows(&rows, limits);

        debug!(
            "Ranked {}: {} events, {} genres, {} tracks",
            bbox,
            rows.len(),
            ranking.genres.len(),
            ranking.tracks.len()
        );
        Ok(ranking)
    }
}
