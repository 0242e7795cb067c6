//! Shared constants for end-to-end tests

// ============================================================================
// Timeouts
// ============================================================================

/// Max time to wait for a spawned server to answer on `/`
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;

pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Locations
// ============================================================================

/// Piazza del Duomo
pub const MILAN_LAT: f64 = 45.4642;
pub const MILAN_LON: f64 = 9.1900;

/// Far enough from Milan to fall outside any small radius around it
pub const TURIN_LAT: f64 = 45.0703;
pub const TURIN_LON: f64 = 7.6869;

// ============================================================================
// Catalog ids
// ============================================================================

pub const ARTIST_1_ID: &str = "artist-1";
pub const ARTIST_2_ID: &str = "artist-2";

pub const TRACK_1_ID: &str = "track-1";
pub const TRACK_2_ID: &str = "track-2";
pub const TRACK_3_ID: &str = "track-3";
