//! Face regions as canonical axis-aligned rectangles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("region must have 2 or 4 elements, got {found}")]
    InvalidRegionShape { found: usize },
}

/// An axis-aligned rectangle with `xmin <= xmax` and `ymin <= ymax`.
///
/// Regions are identified only by their position in the detector output;
/// nothing downstream re-matches them geometrically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Region {
    /// Build a region from two opposite corners in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
        }
    }

    /// Zero-area region at a single point.
    pub fn from_point(x: f64, y: f64) -> Self {
        Self {
            xmin: x,
            ymin: y,
            xmax: x,
            ymax: y,
        }
    }

    /// Inclusive containment test: points on the border are inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.xmin <= x && x <= self.xmax && self.ymin <= y && y <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Canonicalize a box given as 4 corner coordinates `(x1, y1, x2, y2)` or a
/// 2-element point `(x, y)`.
pub fn normalize(values: &[f64]) -> Result<Region, RegionError> {
    match *values {
        [x1, y1, x2, y2] => Ok(Region::from_corners(x1, y1, x2, y2)),
        [x, y] => Ok(Region::from_point(x, y)),
        _ => Err(RegionError::InvalidRegionShape {
            found: values.len(),
        }),
    }
}

/// Normalize a whole region set, failing on the first malformed box.
///
/// A partially valid set is never returned: region indices are the identity
/// of each face, so dropping one would shift every index after it.
pub fn normalize_all<B: AsRef<[f64]>>(boxes: &[B]) -> Result<Vec<Region>, RegionError> {
    boxes.iter().map(|b| normalize(b.as_ref())).collect()
}
