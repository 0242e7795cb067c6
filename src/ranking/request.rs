//! Validated form of a trending query.

use std::time::Duration;

use serde::Deserialize;

use super::models::{
    RankLimits, DEFAULT_PER_CELL_GENRE_LIMIT, DEFAULT_PER_CELL_TRACK_LIMIT, DEFAULT_TRACK_LIMIT,
};
use crate::error::{VibeError, VibeResult};
use crate::geo::{BoundingBox, GridSpec, DEFAULT_ALLOWED_DIVISIONS};

const DAY_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Defaults and bounds applied when turning raw query parameters into a
/// `ScanRequest`.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingSettings {
    pub default_radius_miles: f64,
    pub default_window_days: f64,
    pub default_track_limit: usize,
    pub per_cell_track_limit: usize,
    pub per_cell_genre_limit: usize,
    pub allowed_divisions: Vec<u32>,
}

impl Default for RankingSettings {
    fn default() -> Self {
        RankingSettings {
            default_radius_miles: 1.0,
            default_window_days: 7.0,
            default_track_limit: DEFAULT_TRACK_LIMIT,
            per_cell_track_limit: DEFAULT_PER_CELL_TRACK_LIMIT,
            per_cell_genre_limit: DEFAULT_PER_CELL_GENRE_LIMIT,
            allowed_divisions: DEFAULT_ALLOWED_DIVISIONS.to_vec(),
        }
    }
}

/// Raw query string of `GET /api/vibe`.
///
/// The region is either a center (`lat`, `lon`, optional `radius` in miles)
/// or an explicit box (`lat_min`, `lat_max`, `lon_min`, `lon_max`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VibeQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub divisions: Option<u32>,
    pub limit: Option<usize>,
    pub window_days: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScanRequest {
    pub region: BoundingBox,
    /// `None` asks for a single ranking of the whole region.
    pub grid: Option<GridSpec>,
    pub window: Duration,
    pub limits: RankLimits,
}

fn check_coordinate(name: &str, value: f64, bound: f64) -> VibeResult<f64> {
    if !value.is_finite() || value < -bound || value > bound {
        return Err(VibeError::InvalidParameter(format!(
            "{} out of range: {}",
            name, value
        )));
    }
    Ok(value)
}

impl ScanRequest {
    pub fn from_query(query: &VibeQuery, settings: &RankingSettings) -> VibeResult<Self> {
        let region = Self::parse_region(query, settings)?;

        let grid = query
            .divisions
            .map(|divisions| GridSpec::new(divisions, &settings.allowed_divisions))
            .transpose()?;

        let window_days = query.window_days.unwrap_or(settings.default_window_days);
        if !window_days.is_finite() || window_days <= 0.0 {
            return Err(VibeError::InvalidParameter(format!(
                "window_days must be positive, got {}",
                window_days
            )));
        }
        let window = Duration::try_from_secs_f64(window_days * DAY_SECS).map_err(|_| {
            VibeError::InvalidParameter(format!("window_days too large: {}", window_days))
        })?;

        if query.limit == Some(0) {
            return Err(VibeError::InvalidParameter(
                "limit must be at least 1".to_string(),
            ));
        }
        let limits = match grid {
            Some(_) => RankLimits {
                genres: Some(settings.per_cell_genre_limit),
                tracks: Some(query.limit.unwrap_or(settings.per_cell_track_limit)),
            },
            None => RankLimits {
                genres: None,
                tracks: Some(query.limit.unwrap_or(settings.default_track_limit)),
            },
        };

        Ok(ScanRequest {
            region,
            grid,
            window,
            limits,
        })
    }

    fn parse_region(query: &VibeQuery, settings: &RankingSettings) -> VibeResult<BoundingBox> {
        let explicit = [query.lat_min, query.lat_max, query.lon_min, query.lon_max];
        let has_center = query.lat.is_some() || query.lon.is_some();

        if explicit.iter().any(Option::is_some) {
            if has_center || query.radius.is_some() {
                return Err(VibeError::InvalidParameter(
                    "give either lat/lon/radius or an explicit box, not both".to_string(),
                ));
            }
            return match explicit {
                [Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)] => {
                    check_coordinate("lat_min", lat_min, 90.0)?;
                    check_coordinate("lat_max", lat_max, 90.0)?;
                    check_coordinate("lon_min", lon_min, 180.0)?;
                    check_coordinate("lon_max", lon_max, 180.0)?;
                    BoundingBox::try_new(lat_min, lat_max, lon_min, lon_max)
                }
                _ => Err(VibeError::InvalidParameter(
                    "explicit box needs lat_min, lat_max, lon_min and lon_max".to_string(),
                )),
            };
        }

        let (lat, lon) = match (query.lat, query.lon) {
            (Some(lat), Some(lon)) => (
                check_coordinate("lat", lat, 90.0)?,
                check_coordinate("lon", lon, 180.0)?,
            ),
            _ => {
                return Err(VibeError::InvalidParameter(
                    "missing lat/lon".to_string(),
                ))
            }
        };
        let radius = query.radius.unwrap_or(settings.default_radius_miles);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(VibeError::InvalidParameter(format!(
                "radius must be positive, got {}",
                radius
            )));
        }
        Ok(BoundingBox::from_center_radius(lat, lon, radius))
    }
}
