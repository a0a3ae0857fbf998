//! SCRFD face detector via ONNX Runtime.
//!
//! Anchor-free 3-stride decoding with NMS post-processing, over RGB still
//! images. Landmark outputs are ignored: only boxes feed the gaze pipeline.

use gazedwell_core::{Detection, FaceDetector};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_SCORE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f64 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0}; set GAZEDWELL_MODEL_DIR to a directory holding the SCRFD model")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Metadata for mapping letterboxed coordinates back to the source image.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx).
type StrideOutputIndices = (usize, usize);

/// SCRFD-based face detector.
pub struct ScrfdDetector {
    session: Session,
    /// Per-stride output indices for strides [8, 16, 32].
    stride_indices: [StrideOutputIndices; 3],
}

impl ScrfdDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        // 6 outputs without landmarks, 9 with.
        if output_names.len() < 6 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires at least 6 outputs (3 strides × score/bbox), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self {
            session,
            stride_indices,
        })
    }

    /// Letterbox an RGB image into a normalized NCHW tensor.
    fn preprocess(image: &RgbImage) -> (Array4<f32>, LetterboxInfo) {
        let (width, height) = image.dimensions();
        let letterbox = letterbox_for(width, height);

        let new_w = ((width as f32 * letterbox.scale).round() as u32).max(1);
        let new_h = ((height as f32 * letterbox.scale).round() as u32).max(1);
        let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

        let pad_x_start = letterbox.pad_x.floor() as usize;
        let pad_y_start = letterbox.pad_y.floor() as usize;

        // Padding is SCRFD_MEAN, which normalizes to 0.0.
        let mut tensor = Array4::<f32>::zeros((1, 3, SCRFD_INPUT_SIZE, SCRFD_INPUT_SIZE));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let tx = x as usize + pad_x_start;
            let ty = y as usize + pad_y_start;
            if tx >= SCRFD_INPUT_SIZE || ty >= SCRFD_INPUT_SIZE {
                continue;
            }
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = (pixel[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
            }
        }

        (tensor, letterbox)
    }
}

impl FaceDetector for ScrfdDetector {
    type Image = RgbImage;
    type Error = DetectorError;

    /// Detect faces, returning boxes sorted by descending confidence.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
        let (input, letterbox) = Self::preprocess(image);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();
        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                scores,
                bboxes,
                stride,
                &letterbox,
                SCRFD_SCORE_THRESHOLD,
            ));
        }

        let result = nms(all_detections, SCRFD_NMS_THRESHOLD);
        tracing::debug!(faces = result.len(), "SCRFD detection complete");
        Ok(result)
    }
}

fn letterbox_for(width: u32, height: u32) -> LetterboxInfo {
    let scale_w = SCRFD_INPUT_SIZE as f32 / width.max(1) as f32;
    let scale_h = SCRFD_INPUT_SIZE as f32 / height.max(1) as f32;
    let scale = scale_w.min(scale_h);

    let new_w = (width as f32 * scale).round();
    let new_h = (height as f32 * scale).round();
    LetterboxInfo {
        scale,
        pad_x: (SCRFD_INPUT_SIZE as f32 - new_w) / 2.0,
        pad_y: (SCRFD_INPUT_SIZE as f32 - new_h) / 2.0,
    }
}

/// Discover score/bbox tensor ordering by name ("score_8", "bbox_16", ...),
/// falling back to positional `[0-2] = scores, [3-5] = bboxes`.
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&stride| Some((find("score", stride)?, find("bbox", stride)?)))
        .collect();

    match named {
        Some(indices) => {
            tracing::info!("SCRFD: using name-based output tensor mapping");
            [indices[0], indices[1], indices[2]]
        }
        None => {
            tracing::info!(
                ?names,
                "SCRFD: output names not recognized, using positional mapping [0-2]=scores, [3-5]=bboxes"
            );
            [(0, 3), (1, 4), (2, 5)]
        }
    }
}

/// Decode detections for a single stride level into source-image corners.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    letterbox: &LetterboxInfo,
    threshold: f32,
) -> Vec<Detection> {
    let grid_w = SCRFD_INPUT_SIZE / stride;
    let grid_h = SCRFD_INPUT_SIZE / stride;
    let num_anchors = grid_h * grid_w * SCRFD_ANCHORS_PER_CELL;
    let s = stride as f32;

    let mut detections = Vec::new();
    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let bbox_off = idx * 4;
        if bbox_off + 3 >= bboxes.len() {
            continue;
        }

        let anchor_idx = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_cx = (anchor_idx % grid_w) as f32 * s;
        let anchor_cy = (anchor_idx / grid_w) as f32 * s;

        let x1 = anchor_cx - bboxes[bbox_off] * s;
        let y1 = anchor_cy - bboxes[bbox_off + 1] * s;
        let x2 = anchor_cx + bboxes[bbox_off + 2] * s;
        let y2 = anchor_cy + bboxes[bbox_off + 3] * s;

        let unmap_x = |v: f32| ((v - letterbox.pad_x) / letterbox.scale) as f64;
        let unmap_y = |v: f32| ((v - letterbox.pad_y) / letterbox.scale) as f64;

        detections.push(Detection::new(
            [unmap_x(x1), unmap_y(y1), unmap_x(x2), unmap_y(y2)],
            score,
        ));
    }

    detections
}

/// Non-Maximum Suppression; output is sorted by descending confidence.
fn nms(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::new();
    for det in detections {
        if keep.iter().all(|kept| iou(kept, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection-over-Union between two detections.
fn iou(a: &Detection, b: &Detection) -> f64 {
    let [ax1, ay1, ax2, ay2] = a.corners;
    let [bx1, by1, bx2, by2] = b.corners;

    let inter_w = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
    let inter_h = (ay2.min(by2) - ay1.max(by1)).max(0.0);
    let inter_area = inter_w * inter_h;

    let area_a = (ax2 - ax1) * (ay2 - ay1);
    let area_b = (bx2 - bx1) * (by2 - by1);
    let union_area = area_a + area_b - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}
