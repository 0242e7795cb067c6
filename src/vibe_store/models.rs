//! Records held by the vibe store.
//!
//! Ids are SQLite rowids. Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};

use crate::error::{VibeError, VibeResult};

/// Genre assigned to tracks reported without one. Never ranked.
pub const OTHER_GENRE: &str = "Other";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

impl Genre {
    pub fn is_other(&self) -> bool {
        self.name == OTHER_GENRE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub external_id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub album: Option<String>,
    pub artist_id: i64,
    pub genre_id: i64,
    pub popularity: i64,
    /// Genre tag exactly as reported, before falling back to `OTHER_GENRE`.
    pub original_genre: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Plays of one track at one location, aggregated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VibeEvent {
    pub id: i64,
    pub location: Location,
    pub track_id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
    pub play_count: i64,
    pub last_seen: i64,
}

/// One row of a windowed box query: an event joined with its track metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRow {
    pub track: Track,
    pub artist: Artist,
    pub genre: Genre,
    pub lat: f64,
    pub lon: f64,
    pub play_count: i64,
    pub last_seen: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub genres: usize,
    pub artists: usize,
    pub tracks: usize,
    pub locations: usize,
    pub events: usize,
}

// =============================================================================
// Ingestion input
// =============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ArtistReport {
    pub external_id: String,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TrackReport {
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Left unset, a repeat report keeps the stored value.
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
    pub artist: ArtistReport,
}

/// A single "now playing here" report.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VibeReport {
    pub lat: f64,
    pub lon: f64,
    pub track: TrackReport,
}

impl VibeReport {
    pub fn validate(&self) -> VibeResult<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(VibeError::InvalidParameter(format!(
                "latitude out of range: {}",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(VibeError::InvalidParameter(format!(
                "longitude out of range: {}",
                self.lon
            )));
        }
        if self.track.external_id.trim().is_empty() {
            return Err(VibeError::InvalidParameter("track.external_id is empty".into()));
        }
        if self.track.artist.external_id.trim().is_empty() {
            return Err(VibeError::InvalidParameter(
                "track.artist.external_id is empty".into(),
            ));
        }
        if let Some(popularity) = self.track.popularity.filter(|p| *p < 0) {
            return Err(VibeError::InvalidParameter(format!(
                "negative popularity: {}",
                popularity
            )));
        }
        Ok(())
    }

    /// The reported genre, trimmed, if it is not blank.
    pub fn tagged_genre(&self) -> Option<&str> {
        self.track
            .genre
            .as_deref()
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
    }

    /// Genre the track is filed under.
    pub fn genre_name(&self) -> &str {
        self.tagged_genre().unwrap_or(OTHER_GENRE)
    }
}
