use std::path::Path;

use crossterm::Command as _;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use image::{DynamicImage, GrayImage, Rgb, RgbImage, imageops};

use crate::backend::Backend;
use crate::error::{AppError, Result};
use crate::ramp::GlyphRamp;

/// Grayscale surface plus an optional color surface of the same geometry.
#[derive(Debug, Clone)]
pub struct Surfaces {
    pub gray: GrayImage,
    pub color: Option<RgbImage>,
}

impl Surfaces {
    pub fn from_image(image: &DynamicImage, with_color: bool) -> Self {
        Self {
            gray: image.to_luma8(),
            color: with_color.then(|| image.to_rgb8()),
        }
    }

    pub fn from_rgb(image: RgbImage, with_color: bool) -> Self {
        Self {
            gray: imageops::grayscale(&image),
            color: with_color.then_some(image),
        }
    }
}

/// One rasterized image: a row-major grid of glyphs with an optional
/// parallel grid of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    glyphs: Vec<char>,
    colors: Option<Vec<Rgb<u8>>>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_color(&self) -> bool {
        self.colors.is_some()
    }

    pub fn row(&self, y: u32) -> &[char] {
        let start = (y * self.width) as usize;
        &self.glyphs[start..start + self.width as usize]
    }

    pub fn glyph(&self, x: u32, y: u32) -> char {
        self.glyphs[(y * self.width + x) as usize]
    }

    pub fn color(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        self.colors
            .as_ref()
            .map(|colors| colors[(y * self.width + x) as usize])
    }

    /// Rows of glyphs, each terminated by a newline.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            text.extend(self.row(y));
            text.push('\n');
        }
        text
    }

    /// Like [`Frame::to_text`], with 24-bit foreground colors when the frame
    /// carries them. Line structure is identical to the plain text.
    pub fn to_ansi(&self) -> String {
        if !self.has_color() {
            return self.to_text();
        }
        let mut text = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(Rgb([r, g, b])) = self.color(x, y) {
                    let _ = SetForegroundColor(Color::Rgb { r, g, b }).write_ansi(&mut text);
                }
                text.push(self.glyph(x, y));
            }
            let _ = ResetColor.write_ansi(&mut text);
            text.push('\n');
        }
        text
    }
}

/// Largest glyph grid a single frame may hold.
pub const MAX_CELLS: u64 = 1 << 25;

/// Target grid size for `scale`; each axis is floored independently.
///
/// Fails with [`AppError::GridTooLarge`] before anything is allocated when
/// the grid would exceed [`MAX_CELLS`].
pub fn target_dimensions(width: u32, height: u32, scale: f64) -> Result<(u32, u32)> {
    validate_scale(scale)?;
    let columns = (f64::from(width) * scale).floor();
    let rows = (f64::from(height) * scale).floor();

    // An empty axis still emits one line or column per cell of the other.
    if columns.max(1.0) * rows.max(1.0) > MAX_CELLS as f64 {
        return Err(AppError::GridTooLarge {
            columns: columns as u64,
            rows: rows as u64,
            max_cells: MAX_CELLS,
        });
    }
    Ok((columns as u32, rows as u32))
}

pub fn validate_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(AppError::InvalidScale(scale))
    }
}

pub fn rasterize(
    surfaces: &Surfaces,
    ramp: &GlyphRamp,
    scale: f64,
    backend: &dyn Backend,
) -> Result<Frame> {
    let (width, height) = target_dimensions(surfaces.gray.width(), surfaces.gray.height(), scale)?;
    let cells = width as usize * height as usize;

    if cells == 0 {
        return Ok(Frame {
            width,
            height,
            glyphs: Vec::new(),
            colors: surfaces.color.as_ref().map(|_| Vec::new()),
        });
    }

    let gray = backend.resample_gray(&surfaces.gray, width, height);
    let color = surfaces
        .color
        .as_ref()
        .map(|color| backend.resample_color(color, width, height));

    let mut glyphs = Vec::with_capacity(cells);
    let mut colors = color.as_ref().map(|_| Vec::with_capacity(cells));

    for y in 0..height {
        for x in 0..width {
            glyphs.push(ramp.glyph_for(backend.luma_at(&gray, x, y)));
            if let (Some(colors), Some(color)) = (colors.as_mut(), color.as_ref()) {
                colors.push(backend.rgb_at(color, x, y));
            }
        }
    }

    Ok(Frame {
        width,
        height,
        glyphs,
        colors,
    })
}

/// Decodes a still image into rasterizer surfaces.
pub fn decode_file(path: &Path, with_color: bool, backend: &dyn Backend) -> Result<Surfaces> {
    if !path.exists() {
        return Err(AppError::InputNotFound(path.to_path_buf()));
    }
    let image = backend.decode_image(path)?;
    Ok(Surfaces::from_image(&image, with_color))
}

/// Decodes a still image and rasterizes it.
pub fn rasterize_file(
    path: &Path,
    ramp: &GlyphRamp,
    scale: f64,
    with_color: bool,
    backend: &dyn Backend,
) -> Result<Frame> {
    let surfaces = decode_file(path, with_color, backend)?;
    rasterize(&surfaces, ramp, scale, backend)
}
