//! Minimal 3×5 bitmap font for face legends and dwell labels.
//!
//! Covers digits, the letters used in labels, and basic punctuation.
//! Unknown characters render as blanks.

use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

/// Each row is 3 bits wide, most significant bit on the left.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'C' => [0x7, 0x4, 0x4, 0x4, 0x7],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x5, 0x5, 0x5],
        'O' => [0x7, 0x5, 0x5, 0x5, 0x7],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        ',' => [0x0, 0x0, 0x0, 0x2, 0x4],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '(' => [0x1, 0x2, 0x2, 0x2, 0x1],
        ')' => [0x4, 0x2, 0x2, 0x2, 0x4],
        _ => [0x0; 5],
    }
}

/// Horizontal advance per character at the given scale (glyph + 1 column gap).
pub fn advance(scale: u32) -> u32 {
    (GLYPH_WIDTH + 1) * scale
}

pub fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// Draw `text` with its top-left corner at `(x, y)`. Pixels outside the
/// image are clipped.
pub fn draw_text(image: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, scale: u32) {
    let mut cx = x;
    for c in text.chars() {
        draw_char(image, cx, y, c, color, scale);
        cx += advance(scale) as i64;
    }
}

fn draw_char(image: &mut RgbImage, x: i64, y: i64, c: char, color: Rgb<u8>, scale: u32) {
    let (width, height) = image.dimensions();
    let scale = scale as i64;

    for (row, bits) in glyph(c).iter().enumerate() {
        for col in 0..GLYPH_WIDTH as i64 {
            if bits & (0x4 >> col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row as i64 * scale + dy;
                    if px >= 0 && py >= 0 && px < width as i64 && py < height as i64 {
                        image.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}
