use serde::Serialize;
use std::time::Duration;

use crate::geo::BoundingBox;
use crate::vibe_store::{Artist, Genre, Track};

/// Trailing window used when a query doesn't specify one.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub const DEFAULT_TRACK_LIMIT: usize = 15;
pub const DEFAULT_PER_CELL_TRACK_LIMIT: usize = 2;
pub const DEFAULT_PER_CELL_GENRE_LIMIT: usize = 2;

/// How many entries of each list a ranking keeps. `None` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankLimits {
    pub genres: Option<usize>,
    pub tracks: Option<usize>,
}

impl RankLimits {
    /// Limits for a single ranking over the whole requested region.
    pub fn whole_box() -> Self {
        RankLimits {
            genres: None,
            tracks: Some(DEFAULT_TRACK_LIMIT),
        }
    }

    /// Limits applied to every cell of a grid scan.
    pub fn per_cell() -> Self {
        RankLimits {
            genres: Some(DEFAULT_PER_CELL_GENRE_LIMIT),
            tracks: Some(DEFAULT_PER_CELL_TRACK_LIMIT),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedTrack {
    pub track: Track,
    pub artist: Artist,
    pub genre: Genre,
    /// Plays summed over every location inside the ranked box.
    pub play_count: i64,
    pub last_seen: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedGenre {
    pub genre: Genre,
    pub genre_total_count: i64,
    /// Mean popularity of the distinct tracks of this genre in the box.
    pub genre_avg_popularity: f64,
    /// Highest ranked track of the genre, for display.
    pub top_track: RankedTrack,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VibeRanking {
    pub genres: Vec<RankedGenre>,
    pub tracks: Vec<RankedTrack>,
}

impl VibeRanking {
    /// True when no event matched, genres can be empty on their own when
    /// every track is untagged.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Ranking of one grid cell, as returned by a scan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellRanking {
    /// Row-major position of the cell, bottom-left is 0.
    pub cell_index: usize,
    pub cell: BoundingBox,
    pub genres: Vec<RankedGenre>,
    pub tracks: Vec<RankedTrack>,
}
