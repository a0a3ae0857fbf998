//! Face detector capability.
//!
//! The core never depends on a concrete detector; anything that turns an
//! image into confidence-scored boxes can drive the pipeline, including
//! fixture detectors in tests.

use crate::region::{Region, RegionError};
use serde::{Deserialize, Serialize};

/// One detector output: a box as two opposite corners plus a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in image pixel coordinates.
    pub corners: [f64; 4],
    pub confidence: f32,
}

impl Detection {
    pub fn new(corners: [f64; 4], confidence: f32) -> Self {
        Self { corners, confidence }
    }

    pub fn region(&self) -> Result<Region, RegionError> {
        crate::region::normalize(&self.corners)
    }
}

/// Anything that can find faces in an image.
///
/// Detections are returned in the detector's own order; that order becomes
/// the face index for the rest of the pipeline.
pub trait FaceDetector {
    type Image: ?Sized;
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&mut self, image: &Self::Image) -> Result<Vec<Detection>, Self::Error>;
}
