//! Row-major subdivision of a bounding box into equal cells.

use super::BoundingBox;
use crate::error::{VibeError, VibeResult};

/// Grid sizes accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_DIVISIONS: &[u32] = &[1, 4, 9, 16];

/// Largest `s` such that `s * s <= n`.
pub fn integer_sqrt(n: u32) -> u32 {
    let n = n as u64;
    let mut side = (n as f64).sqrt() as u64;
    while side * side > n {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= n {
        side += 1;
    }
    // floor(sqrt(u32::MAX)) fits in a u16
    side as u32
}

/// A validated grid size: a perfect square taken from an allow-list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    divisions: u32,
    side: u32,
}

impl GridSpec {
    pub fn new(divisions: u32, allowed: &[u32]) -> VibeResult<Self> {
        let unsupported = || VibeError::UnsupportedGridSize {
            divisions,
            allowed: allowed.to_vec(),
        };
        if divisions == 0 || !allowed.contains(&divisions) {
            return Err(unsupported());
        }
        let side = integer_sqrt(divisions);
        if side * side != divisions {
            return Err(unsupported());
        }
        Ok(GridSpec { divisions, side })
    }

    /// A 1x1 grid, i.e. the whole region as a single cell.
    pub fn single() -> Self {
        GridSpec {
            divisions: 1,
            side: 1,
        }
    }

    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    pub fn side(&self) -> u32 {
        self.side
    }
}

pub struct GridPartitioner;

impl GridPartitioner {
    /// Split `bbox` into `floor(sqrt(divisions))^2` cells.
    ///
    /// Non-square `divisions` are not rejected here, they shrink to the
    /// nearest lower square. Go through `GridSpec` to get strict validation.
    pub fn partition(bbox: BoundingBox, divisions: u32) -> GridCells {
        GridCells::new(bbox, integer_sqrt(divisions))
    }

    pub fn partition_spec(bbox: BoundingBox, grid: GridSpec) -> GridCells {
        GridCells::new(bbox, grid.side())
    }
}

/// Lazy sequence of grid cells, bottom row first, left to right within a row.
#[derive(Clone, Debug)]
pub struct GridCells {
    bbox: BoundingBox,
    side: u32,
    delta_lat: f64,
    delta_lon: f64,
    next: u32,
}

impl GridCells {
    fn new(bbox: BoundingBox, side: u32) -> Self {
        let (delta_lat, delta_lon) = if side == 0 {
            (0.0, 0.0)
        } else {
            (bbox.lat_span() / side as f64, bbox.lon_span() / side as f64)
        };
        GridCells {
            bbox,
            side,
            delta_lat,
            delta_lon,
            next: 0,
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    // Boundaries are computed as `base + i * delta`; the last one is pinned
    // to the box edge so the cells cover the box exactly.
    fn lat_edge(&self, row: u32) -> f64 {
        if row == self.side {
            self.bbox.lat_max
        } else {
            self.bbox.lat_min + row as f64 * self.delta_lat
        }
    }

    fn lon_edge(&self, col: u32) -> f64 {
        if col == self.side {
            self.bbox.lon_max
        } else {
            self.bbox.lon_min + col as f64 * self.delta_lon
        }
    }
}

impl Iterator for GridCells {
    type Item = BoundingBox;

    fn next(&mut self) -> Option<BoundingBox> {
        let total = self.side * self.side;
        if self.next >= total {
            return None;
        }
        let row = self.next / self.side;
        let col = self.next % self.side;
        self.next += 1;

        Some(BoundingBox::new(
            self.lat_edge(row),
            self.lat_edge(row + 1),
            self.lon_edge(col),
            self.lon_edge(col + 1),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.side * self.side - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridCells {}
