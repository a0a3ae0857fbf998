//! Dwell-time overlay rendering.

use crate::font;
use gazedwell_core::{OverlayItem, Region};
use image::{Rgb, RgbImage};

const BOX_THICKNESS: u32 = 2;
const LABEL_SCALE: u32 = 3;
/// Gap between a label's bottom edge and the top of its box.
const LABEL_OFFSET: i64 = 10;

/// Draw a rectangle outline `thickness` pixels wide, growing inward from
/// the region border. Clipped to the image.
pub fn draw_rect(image: &mut RgbImage, region: &Region, color: Rgb<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let clamp_x = |v: f64| (v.round().max(0.0) as u32).min(width - 1);
    let clamp_y = |v: f64| (v.round().max(0.0) as u32).min(height - 1);
    let (x0, x1) = (clamp_x(region.xmin), clamp_x(region.xmax));
    let (y0, y1) = (clamp_y(region.ymin), clamp_y(region.ymax));

    for t in 0..thickness {
        let top = (y0 + t).min(y1);
        let bottom = y1.saturating_sub(t).max(y0);
        let left = (x0 + t).min(x1);
        let right = x1.saturating_sub(t).max(x0);

        for x in x0..=x1 {
            image.put_pixel(x, top, color);
            image.put_pixel(x, bottom, color);
        }
        for y in y0..=y1 {
            image.put_pixel(left, y, color);
            image.put_pixel(right, y, color);
        }
    }
}

/// Colour for a dwell intensity: red, scaled.
pub fn intensity_color(intensity: u8) -> Rgb<u8> {
    Rgb([intensity, 0, 0])
}

/// Copy `image` and draw each region's box and dwell label on it.
pub fn render_dwell_overlay(image: &RgbImage, items: &[OverlayItem]) -> RgbImage {
    let mut canvas = image.clone();

    for item in items {
        let color = intensity_color(item.intensity);
        draw_rect(&mut canvas, &item.region, color, BOX_THICKNESS);

        let label_y = item.region.ymin.round() as i64 - LABEL_OFFSET - font::text_height(LABEL_SCALE) as i64;
        font::draw_text(
            &mut canvas,
            item.region.xmin.round() as i64,
            label_y.max(0),
            &item.label,
            color,
            LABEL_SCALE,
        );
    }

    tracing::debug!(regions = items.len(), "rendered dwell overlay");
    canvas
}
