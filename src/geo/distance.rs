//! Approximate conversions between linear distances and angular extents.
//!
//! Everything here assumes city-scale regions: longitude compression with
//! latitude is ignored, and nothing handles the poles or the antimeridian.

use super::BoundingBox;

/// Earth's mean radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Nautical miles in one statute mile.
pub const NAUTICAL_MILES_PER_MILE: f64 = 0.868_976;

/// One nautical mile spans one arcminute of a great circle.
const ARCMINUTES_PER_DEGREE: f64 = 60.0;

pub fn miles_to_nautical(miles: f64) -> f64 {
    miles * NAUTICAL_MILES_PER_MILE
}

/// Angular delta (degrees) covering half of `radius_miles`.
pub fn radius_to_degrees(radius_miles: f64) -> f64 {
    let arcminutes = miles_to_nautical(radius_miles / 2.0);
    arcminutes / ARCMINUTES_PER_DEGREE
}

/// Box around `center` (lat, lon), with the same degree delta applied to both axes.
///
/// `radius_miles` must be positive; callers validate it.
pub fn expand_radius(center: (f64, f64), radius_miles: f64) -> BoundingBox {
    let (lat, lon) = center;
    let delta = radius_to_degrees(radius_miles);
    BoundingBox::new(lat - delta, lat + delta, lon - delta, lon + delta)
}

/// Haversine distance in miles between two (lat, lon) points.
pub fn great_circle_miles(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Corner-to-corner distance of a box. Only used for logging.
pub fn diagonal_miles(bbox: &BoundingBox) -> f64 {
    great_circle_miles(bbox.min_point(), bbox.max_point())
}
