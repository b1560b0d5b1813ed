//! Decode backends. Each one decodes stills and video, and owns the
//! resampling filter used when a surface is scaled down to the glyph grid.

use std::path::Path;

use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageError, Rgb, RgbImage};

use crate::error::{AppError, Result};
use crate::video::{self, VideoFrames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Method {
    /// Pure Rust decoding, stills only
    #[default]
    Pillow,
    /// ffmpeg-assisted decoding, stills and video
    Opencv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub video: bool,
}

pub trait Backend {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    fn decode_image(&self, path: &Path) -> Result<DynamicImage>;

    fn decode_video_frames(&self, path: &Path) -> Result<VideoFrames>;

    fn filter(&self) -> FilterType;

    fn resample_gray(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage {
        imageops::resize(image, width, height, self.filter())
    }

    fn resample_color(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage {
        imageops::resize(image, width, height, self.filter())
    }

    fn luma_at(&self, image: &GrayImage, x: u32, y: u32) -> u8 {
        image.get_pixel(x, y)[0]
    }

    fn rgb_at(&self, image: &RgbImage, x: u32, y: u32) -> Rgb<u8> {
        *image.get_pixel(x, y)
    }
}

/// Builds the backend for `method`, checking its capabilities once.
pub fn init(method: Method) -> Box<dyn Backend> {
    let backend: Box<dyn Backend> = match method {
        Method::Pillow => Box::new(ImageBackend),
        Method::Opencv => Box::new(FfmpegBackend::detect()),
    };
    log::info!(
        "using {} backend (video support: {})",
        backend.name(),
        backend.capabilities().video
    );
    backend
}

/// Decodes through the `image` crate alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBackend;

impl Backend for ImageBackend {
    fn name(&self) -> &'static str {
        "pillow"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { video: false }
    }

    fn decode_image(&self, path: &Path) -> Result<DynamicImage> {
        Ok(image::open(path)?)
    }

    fn decode_video_frames(&self, path: &Path) -> Result<VideoFrames> {
        Err(AppError::UnsupportedInput {
            path: path.to_path_buf(),
            reason: "the pillow backend cannot decode video; use --method opencv".to_string(),
        })
    }

    fn filter(&self) -> FilterType {
        FilterType::Nearest
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FfmpegBackend {
    tools_available: bool,
}

impl FfmpegBackend {
    pub fn detect() -> Self {
        let tools_available = video::tools_available();
        if !tools_available {
            log::warn!("ffmpeg/ffprobe not found on PATH; video decoding disabled");
        }
        Self { tools_available }
    }
}

impl Backend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            video: self.tools_available,
        }
    }

    fn decode_image(&self, path: &Path) -> Result<DynamicImage> {
        match image::open(path) {
            Ok(image) => Ok(image),
            Err(ImageError::Unsupported(err)) if self.tools_available => {
                log::debug!("image crate cannot read {} ({err}); trying ffmpeg", path.display());
                Ok(DynamicImage::ImageRgb8(video::decode_still(path)?))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn decode_video_frames(&self, path: &Path) -> Result<VideoFrames> {
        if !self.tools_available {
            return Err(AppError::UnsupportedInput {
                path: path.to_path_buf(),
                reason: "video decoding requires ffmpeg and ffprobe on PATH".to_string(),
            });
        }
        VideoFrames::open(path)
    }

    fn filter(&self) -> FilterType {
        FilterType::Triangle
    }
}
