use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::backend::Method;
use crate::error::Result;
use crate::pipeline::PipelineConfig;
use crate::ramp::{ABBREVIATED_RAMP, GlyphRamp, STANDARD_RAMP};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Render images and videos as text art"
)]
pub struct Cli {
    /// Input image or video path
    #[arg(long)]
    pub input: PathBuf,

    /// Output path (.txt, .png, .jpg, .html or a video); streams to the terminal when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Keep each pixel's color
    #[arg(long = "return_color", alias = "return-color")]
    pub return_color: bool,

    /// Output size relative to the input, per axis
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub scale: f64,

    /// Decode backend
    #[arg(long, value_enum, default_value_t = Method::Pillow)]
    pub method: Method,

    /// Page background for .html output
    #[arg(long = "html_bg_color", alias = "html-bg-color", default_value = "white")]
    pub html_bg_color: String,

    /// Built-in glyph ramp
    #[arg(long, value_enum, default_value_t = RampPreset::Abbreviated)]
    pub ramp: RampPreset,

    /// Custom glyph ramp from dark to light; overrides --ramp
    #[arg(long)]
    pub charset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RampPreset {
    Abbreviated,
    Standard,
}

impl RampPreset {
    pub fn chars(self) -> &'static str {
        match self {
            Self::Abbreviated => ABBREVIATED_RAMP,
            Self::Standard => STANDARD_RAMP,
        }
    }
}

impl Cli {
    pub fn glyph_ramp(&self) -> Result<GlyphRamp> {
        GlyphRamp::new(self.charset.as_deref().unwrap_or(self.ramp.chars()))
    }

    pub fn into_config(self) -> Result<PipelineConfig> {
        let ramp = self.glyph_ramp()?;
        Ok(PipelineConfig {
            input: self.input,
            output: self.output,
            return_color: self.return_color,
            scale: self.scale,
            method: self.method,
            html_bg_color: self.html_bg_color,
            ramp,
        })
    }
}
