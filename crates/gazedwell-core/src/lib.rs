//! gazedwell-core — Gaze-to-face attribution and dwell-time aggregation.
//!
//! Pure, image-free algorithms: region normalization, gaze sample loading,
//! first-match attribution, and per-face dwell aggregation. Face detection
//! is consumed through the [`FaceDetector`] capability trait.

pub mod attribution;
pub mod detector;
pub mod dwell;
pub mod pipeline;
pub mod region;
pub mod report;
pub mod sample;

pub use attribution::{attribute, AttributedSample, Attribution};
pub use detector::{Detection, FaceDetector};
pub use dwell::{aggregate, DwellEntry, DwellReport};
pub use pipeline::{analyze, Analysis};
pub use region::{normalize, Region, RegionError};
pub use report::{OverlayItem, ReportRow};
pub use sample::{GazeSample, InputFormat, LoadError, LoadedSamples, MalformedPolicy};
