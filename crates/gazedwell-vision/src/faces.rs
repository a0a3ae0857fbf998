//! Face detection pass over a still image.
//!
//! Rescales the image, runs a detector, keeps confident faces in detector
//! order, and renders the annotated image with a footer legend. Regions are
//! expressed in the rescaled image's pixel space, the same space the
//! annotated image is drawn in.

use crate::font;
use crate::overlay;
use gazedwell_core::{Detection, FaceDetector, Region};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

const FACE_BOX_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const FACE_BOX_THICKNESS: u32 = 2;
const LEGEND_ROW_HEIGHT: u32 = 30;
const LEGEND_PADDING: u32 = 10;
const LEGEND_TEXT_SCALE: u32 = 3;
const LEGEND_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// SCRFD scores clear frontal faces around 0.6 to 0.9; the detector itself
/// already discards anything at or below 0.5.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.6;

/// Detection pass settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacePassConfig {
    /// Detections below this confidence are dropped.
    pub min_confidence: f32,
    /// Image is resized by this factor before detection.
    pub scale_factor: f32,
    /// Pixels added on every side of each box before clamping.
    pub margin: f64,
}

impl Default for FacePassConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            scale_factor: 1.125,
            margin: 0.0,
        }
    }
}

/// Result of a detection pass.
pub struct FacePass {
    /// Kept faces in detector order; index `i` is "Face {i + 1}".
    pub regions: Vec<Region>,
    /// Rescaled image with face boxes and the footer legend.
    pub annotated: RgbImage,
}

/// Resize by `factor`, truncating to whole pixels.
pub fn rescale(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let new_w = ((width as f32 * factor) as u32).max(1);
    let new_h = ((height as f32 * factor) as u32).max(1);
    if (new_w, new_h) == (width, height) {
        return image.clone();
    }
    imageops::resize(image, new_w, new_h, FilterType::Triangle)
}

/// Keep confident detections, expand by `margin`, and clamp to the image.
///
/// Corners are rounded to whole pixels. Order is preserved. A box that
/// lies outside the image, or that a negative margin shrinks past its
/// centre, is dropped with a warning.
pub fn select_regions(
    detections: &[Detection],
    min_confidence: f32,
    margin: f64,
    width: u32,
    height: u32,
) -> Vec<Region> {
    let max_x = width as f64;
    let max_y = height as f64;

    detections
        .iter()
        .filter(|d| {
            let keep = d.confidence >= min_confidence;
            if !keep {
                tracing::debug!(confidence = d.confidence, min_confidence, "dropping low-confidence face");
            }
            keep
        })
        .filter_map(|d| {
            let r = Region::from_corners(d.corners[0], d.corners[1], d.corners[2], d.corners[3]);
            let (x0, y0) = (r.xmin - margin, r.ymin - margin);
            let (x1, y1) = (r.xmax + margin, r.ymax + margin);
            if x0 > x1 || y0 > y1 {
                tracing::warn!(?r, margin, "margin collapses face box, dropping it");
                return None;
            }

            let clamped = Region::from_corners(
                x0.round().clamp(0.0, max_x),
                y0.round().clamp(0.0, max_y),
                x1.round().clamp(0.0, max_x),
                y1.round().clamp(0.0, max_y),
            );
            if clamped.width() <= 0.0 || clamped.height() <= 0.0 {
                tracing::warn!(?r, width, height, "face box lies outside the image, dropping it");
                return None;
            }
            Some(clamped)
        })
        .collect()
}

/// Legend line for one face, e.g. `"Face 1: (10,20) - (110,140)"`.
pub fn legend_line(index: usize, region: &Region) -> String {
    format!(
        "{}: ({},{}) - ({},{})",
        gazedwell_core::report::face_label(index),
        region.xmin as i64,
        region.ymin as i64,
        region.xmax as i64,
        region.ymax as i64
    )
}

/// Draw face boxes and append a black footer listing each face's corners.
pub fn annotate(image: &RgbImage, regions: &[Region]) -> RgbImage {
    let (width, height) = image.dimensions();
    let footer_height = LEGEND_ROW_HEIGHT * regions.len() as u32 + LEGEND_PADDING;

    let mut canvas = RgbImage::new(width, height + footer_height);
    imageops::replace(&mut canvas, image, 0, 0);

    for (i, region) in regions.iter().enumerate() {
        overlay::draw_rect(&mut canvas, region, FACE_BOX_COLOR, FACE_BOX_THICKNESS);

        let text_top = height + LEGEND_ROW_HEIGHT * (i as u32 + 1)
            - LEGEND_PADDING
            - font::text_height(LEGEND_TEXT_SCALE);
        font::draw_text(
            &mut canvas,
            LEGEND_PADDING as i64,
            text_top as i64,
            &legend_line(i, region),
            LEGEND_TEXT_COLOR,
            LEGEND_TEXT_SCALE,
        );
    }

    canvas
}

/// Rescale, detect, select, and annotate.
pub fn run_face_pass<D>(
    detector: &mut D,
    image: &RgbImage,
    config: &FacePassConfig,
) -> Result<FacePass, D::Error>
where
    D: FaceDetector<Image = RgbImage>,
{
    let scaled = rescale(image, config.scale_factor);
    let (width, height) = scaled.dimensions();

    let detections = detector.detect(&scaled)?;
    let regions = select_regions(&detections, config.min_confidence, config.margin, width, height);

    tracing::info!(
        detected = detections.len(),
        kept = regions.len(),
        width,
        height,
        "face pass complete"
    );

    let annotated = annotate(&scaled, &regions);
    Ok(FacePass { regions, annotated })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixtureDetector {
        detections: Vec<Detection>,
        seen: Option<(u32, u32)>,
    }

    impl FaceDetector for FixtureDetector {
        type Image = RgbImage;
        type Error = std::convert::Infallible;

        fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
            self.seen = Some(image.dimensions());
            Ok(self.detections.clone())
        }
    }

    #[test]
    fn test_select_regions_filters_by_confidence() {
        let detections = vec![
            Detection::new([0.0, 0.0, 10.0, 10.0], 0.99),
            Detection::new([20.0, 20.0, 30.0, 30.0], 0.50),
            Detection::new([40.0, 40.0, 50.0, 50.0], 0.95),
        ];
        let regions = select_regions(&detections, 0.95, 0.0, 100, 100);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].xmin, 0.0);
        assert_eq!(regions[1].xmin, 40.0);
    }

    #[test]
    fn test_select_regions_margin_and_clamp() {
        let detections = vec![Detection::new([2.0, 3.0, 95.0, 48.0], 1.0)];
        let regions = select_regions(&detections, 0.5, 5.0, 100, 50);
        assert_eq!(regions[0], Region { xmin: 0.0, ymin: 0.0, xmax: 100.0, ymax: 50.0 });
    }

    #[test]
    fn test_select_regions_rounds_and_normalizes() {
        let detections = vec![Detection::new([10.6, 20.4, 1.2, 2.5], 1.0)];
        let regions = select_regions(&detections, 0.5, 0.0, 100, 100);
        assert_eq!(regions[0], Region { xmin: 1.0, ymin: 3.0, xmax: 11.0, ymax: 20.0 });
    }

    #[test]
    fn test_select_regions_drops_box_outside_image() {
        let detections = vec![
            Detection::new([120.0, 10.0, 130.0, 20.0], 1.0),
            Detection::new([10.0, 110.0, 20.0, 130.0], 1.0),
            Detection::new([90.0, 90.0, 130.0, 130.0], 1.0),
        ];
        let regions = select_regions(&detections, 0.5, 0.0, 100, 100);
        assert_eq!(regions, vec![Region::from_corners(90.0, 90.0, 100.0, 100.0)]);
    }

    #[test]
    fn test_select_regions_negative_margin() {
        let detections = vec![
            Detection::new([10.0, 10.0, 20.0, 20.0], 1.0),
            Detection::new([30.0, 30.0, 60.0, 60.0], 1.0),
        ];
        // shrinking by 8 inverts the 10px box but leaves 14px of the 30px one
        let regions = select_regions(&detections, 0.5, -8.0, 100, 100);
        assert_eq!(regions, vec![Region::from_corners(38.0, 38.0, 52.0, 52.0)]);
        for r in &regions {
            assert!(r.xmin <= r.xmax && r.ymin <= r.ymax);
        }
    }

    #[test]
    fn test_default_confidence_sits_above_decode_floor() {
        let detections = vec![
            Detection::new([0.0, 0.0, 10.0, 10.0], 0.8),
            Detection::new([20.0, 20.0, 30.0, 30.0], 0.55),
        ];
        let config = FacePassConfig::default();
        let regions = select_regions(&detections, config.min_confidence, config.margin, 100, 100);
        assert_eq!(regions, vec![Region::from_corners(0.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_rescale() {
        let image = RgbImage::new(80, 40);
        assert_eq!(rescale(&image, 1.125).dimensions(), (90, 45));
        assert_eq!(rescale(&image, 1.0).dimensions(), (80, 40));
    }

    #[test]
    fn test_legend_line() {
        let region = Region::from_corners(10.0, 20.0, 110.0, 140.0);
        assert_eq!(legend_line(0, &region), "Face 1: (10,20) - (110,140)");
    }

    #[test]
    fn test_annotate_adds_footer() {
        let image = RgbImage::from_pixel(50, 50, Rgb([9, 9, 9]));
        let regions = vec![
            Region::from_corners(5.0, 5.0, 20.0, 20.0),
            Region::from_corners(25.0, 25.0, 45.0, 45.0),
        ];
        let out = annotate(&image, &regions);
        assert_eq!(out.dimensions(), (50, 50 + 2 * 30 + 10));
        assert_eq!(out.get_pixel(5, 5), &FACE_BOX_COLOR);
        assert_eq!(out.get_pixel(0, 0), &Rgb([9, 9, 9]));
        // footer background stays black where no text is drawn
        assert_eq!(out.get_pixel(49, 50 + 69), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_no_faces() {
        let image = RgbImage::new(10, 10);
        assert_eq!(annotate(&image, &[]).dimensions(), (10, 20));
    }

    #[test]
    fn test_run_face_pass_with_fixture() {
        let mut detector = FixtureDetector {
            detections: vec![
                Detection::new([10.0, 10.0, 30.0, 30.0], 0.99),
                Detection::new([50.0, 50.0, 60.0, 60.0], 0.40),
            ],
            seen: None,
        };
        let image = RgbImage::new(80, 80);
        let pass = run_face_pass(&mut detector, &image, &FacePassConfig::default()).unwrap();
        assert_eq!(detector.seen, Some((90, 90)));
        assert_eq!(pass.regions, vec![Region::from_corners(10.0, 10.0, 30.0, 30.0)]);
        assert_eq!(pass.annotated.dimensions(), (90, 90 + 40));
    }
}
