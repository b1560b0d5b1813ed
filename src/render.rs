use font8x8::UnicodeFonts;
use image::{Rgb, RgbImage};

use crate::ascii::Frame;
use crate::error::{AppError, Result};

/// Side of one glyph cell in pixels.
pub const CELL_SIZE: u32 = 8;

/// Largest canvas side the renderer will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub fn canvas_dimensions(frame: &Frame) -> Result<(u32, u32)> {
    check_grid(frame.width(), frame.height())
}

/// Canvas size for a `columns` x `rows` glyph grid, checked before the grid
/// is rasterized.
pub fn check_grid(columns: u32, rows: u32) -> Result<(u32, u32)> {
    let width = u64::from(columns) * u64::from(CELL_SIZE);
    let height = u64::from(rows) * u64::from(CELL_SIZE);

    if width == 0 || height == 0 {
        return Err(AppError::EmptyFrame);
    }
    if width > u64::from(MAX_CANVAS_SIDE) || height > u64::from(MAX_CANVAS_SIDE) {
        return Err(AppError::CanvasTooLarge {
            width,
            height,
            max: MAX_CANVAS_SIDE,
        });
    }

    Ok((width as u32, height as u32))
}

/// Paints every cell's glyph at (column, row) in the cell color, or black.
pub fn render_frame(frame: &Frame) -> Result<RgbImage> {
    let (width, height) = canvas_dimensions(frame)?;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    for row in 0..frame.height() {
        for col in 0..frame.width() {
            let ink = frame.color(col, row).unwrap_or(INK);
            draw_glyph(&mut canvas, col * CELL_SIZE, row * CELL_SIZE, frame.glyph(col, row), ink);
        }
    }

    Ok(canvas)
}

fn draw_glyph(canvas: &mut RgbImage, x: u32, y: u32, ch: char, ink: Rgb<u8>) {
    let fallback = font8x8::BASIC_FONTS.get('?').unwrap_or([0; 8]);
    let glyph = font8x8::BASIC_FONTS.get(ch).unwrap_or(fallback);

    for (gy, row_bits) in glyph.iter().enumerate() {
        for gx in 0..CELL_SIZE {
            if (row_bits >> gx) & 1 == 1 {
                canvas.put_pixel(x + gx, y + gy as u32, ink);
            }
        }
    }
}
