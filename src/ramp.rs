//! Brightness quantization onto an ordered glyph ramp.
//!
//! Samples are 8-bit, so the scaling divisor is 256 (the number of levels)
//! rather than 255 (the largest value): `index = b * N / 256`. Every bucket
//! then spans the same number of levels and white still lands on the last
//! glyph. The result is clamped to `N - 1` regardless.

use image::Rgb;

use crate::error::{AppError, Result};

/// Ten glyphs, dense to sparse.
pub const ABBREVIATED_RAMP: &str = "@%#*+=-:. ";

/// Paul Bourke's 70 glyph ramp, dense to sparse.
pub const STANDARD_RAMP: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Number of distinct brightness levels in an 8-bit sample.
pub const BRIGHTNESS_LEVELS: usize = 256;

/// Ordered glyphs used as brightness buckets. Darker samples pick earlier glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    pub fn new(chars: &str) -> Result<Self> {
        let glyphs: Vec<char> = chars.chars().collect();
        if glyphs.is_empty() {
            return Err(AppError::EmptyRamp);
        }
        // Frames are line-based text; a glyph must never break a row.
        if let Some(&control) = glyphs.iter().find(|ch| ch.is_control()) {
            return Err(AppError::ControlGlyph(control));
        }
        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    pub fn index_for(&self, brightness: u8) -> usize {
        quantize(brightness, self.glyphs.len())
    }

    pub fn glyph_for(&self, brightness: u8) -> char {
        self.glyphs[self.index_for(brightness)]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            glyphs: ABBREVIATED_RAMP.chars().collect(),
        }
    }
}

/// Maps a brightness sample onto one of `levels` buckets.
pub fn quantize(brightness: u8, levels: usize) -> usize {
    let index = usize::from(brightness) * levels / BRIGHTNESS_LEVELS;
    index.min(levels.saturating_sub(1))
}

/// Formats a color as `#rrggbb`, lowercase.
pub fn hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}
