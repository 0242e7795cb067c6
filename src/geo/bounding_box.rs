use serde::{Deserialize, Serialize};

use crate::error::{VibeError, VibeResult};

/// Axis-aligned latitude/longitude rectangle, in degrees.
///
/// `new` performs no validation: keeping `lat_min <= lat_max` and
/// `lon_min <= lon_max` is the caller's job. Use `try_new` when the corners
/// come from user input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        BoundingBox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Build a box, failing with `InvalidRegion` on inverted or non-finite corners.
    pub fn try_new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> VibeResult<Self> {
        let finite = [lat_min, lat_max, lon_min, lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || lat_min > lat_max || lon_min > lon_max {
            return Err(VibeError::InvalidRegion {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
            });
        }
        Ok(Self::new(lat_min, lat_max, lon_min, lon_max))
    }

    /// Box of `radius_miles` around a center point, see `distance::expand_radius`.
    pub fn from_center_radius(lat: f64, lon: f64, radius_miles: f64) -> Self {
        super::distance::expand_radius((lat, lon), radius_miles)
    }

    /// Bottom-left corner as (lat, lon).
    pub fn min_point(&self) -> (f64, f64) {
        (self.lat_min, self.lon_min)
    }

    /// Top-right corner as (lat, lon).
    pub fn max_point(&self) -> (f64, f64) {
        (self.lat_max, self.lon_max)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Half-open containment: `[lat_min, lat_max) x [lon_min, lon_max)`.
    ///
    /// Adjacent grid cells share an edge, so a point lying on it is counted
    /// in exactly one of them (the one above / to the right).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat < self.lat_max && lon >= self.lon_min && lon < self.lon_max
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}]x[{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}
