//! gazedwell-vision — Image side of the gaze pipeline.
//!
//! SCRFD face detection via ONNX Runtime, the per-image detection pass with
//! its annotated legend image, and dwell overlay rendering.

pub mod detector;
pub mod faces;
pub mod font;
pub mod overlay;

pub use detector::{DetectorError, ScrfdDetector};
pub use faces::{run_face_pass, FacePass, FacePassConfig};
pub use overlay::render_dwell_overlay;

/// SCRFD model file name expected in the model directory.
pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
