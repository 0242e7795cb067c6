//! Error kinds surfaced by the ranking core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VibeError {
    #[error("Invalid region: lat [{lat_min}, {lat_max}], lon [{lon_min}, {lon_max}]")]
    InvalidRegion {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    #[error("Unsupported grid size {divisions}, allowed: {allowed:?}")]
    UnsupportedGridSize { divisions: u32, allowed: Vec<u32> },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Vibe store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),
}

impl VibeError {
    /// True for errors caused by the caller's input rather than by the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, VibeError::StoreUnavailable(_))
    }
}

pub type VibeResult<T> = std::result::Result<T, VibeError>;
