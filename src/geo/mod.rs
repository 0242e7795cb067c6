mod bounding_box;
pub mod distance;
mod grid;

pub use bounding_box::BoundingBox;
pub use distance::{diagonal_miles, expand_radius, great_circle_miles};
pub use grid::{integer_sqrt, GridCells, GridPartitioner, GridSpec, DEFAULT_ALLOWED_DIVISIONS};
