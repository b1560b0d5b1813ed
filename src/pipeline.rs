use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::ascii::{Surfaces, decode_file, rasterize, target_dimensions, validate_scale};
use crate::backend::{self, Backend, Method};
use crate::cache::FrameCache;
use crate::error::{AppError, Result};
use crate::media::{self, IMAGE_EXTENSIONS, MediaKind, VIDEO_EXTENSIONS};
use crate::playback::{FRAME_INTERVAL, Player};
use crate::ramp::GlyphRamp;
use crate::render;
use crate::sink::{self, Sink};
use crate::video;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    /// `None` streams to the terminal.
    pub output: Option<PathBuf>,
    pub return_color: bool,
    pub scale: f64,
    pub method: Method,
    pub html_bg_color: String,
    pub ramp: GlyphRamp,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            return_color: false,
            scale: 1.0,
            method: Method::default(),
            html_bg_color: "white".to_string(),
            ramp: GlyphRamp::default(),
        }
    }

    /// The cache this input replays from, keyed on its bytes and the
    /// render settings.
    pub fn frame_cache(&self) -> Result<FrameCache> {
        FrameCache::for_source(&self.input, &self.cache_params())
    }

    /// Everything besides the source bytes that changes the rendered frames.
    fn cache_params(&self) -> String {
        let ramp: String = self.ramp.glyphs().iter().collect();
        format!(
            "ramp={ramp};scale={};color={}",
            self.scale, self.return_color
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: usize,
    pub replayed_from_cache: bool,
}

pub fn run(config: &PipelineConfig) -> Result<PipelineStats> {
    if !config.input.exists() {
        return Err(AppError::InputNotFound(config.input.clone()));
    }
    validate_scale(config.scale)?;

    let sink = Sink::for_output(config.output.as_deref(), &config.html_bg_color)?;
    let kind = MediaKind::classify(&config.input);
    log::info!("{} classified as {kind:?}, output {sink:?}", config.input.display());

    match kind {
        MediaKind::Image => {
            if let Sink::Video(path) = &sink {
                return Err(output_mismatch(path, &sink::accepted_image_outputs()));
            }
            let backend = backend::init(config.method);
            convert_image(config, &sink, backend.as_ref())
        }
        MediaKind::Video => {
            let backend = backend::init(config.method);
            match &sink {
                Sink::Terminal => play_video(config, backend.as_ref()),
                Sink::Video(path) => transcode_video(config, path, backend.as_ref()),
                Sink::Text(path) | Sink::Raster(path) | Sink::Markup { path, .. } => {
                    Err(output_mismatch(path, &sink::accepted_video_outputs()))
                }
            }
        }
        MediaKind::Unknown => Err(AppError::UnsupportedInput {
            path: config.input.clone(),
            reason: format!(
                "unrecognized input type; accepted images: {}; accepted videos: {}",
                media::describe(IMAGE_EXTENSIONS),
                media::describe(VIDEO_EXTENSIONS)
            ),
        }),
    }
}

fn output_mismatch(path: &Path, accepted: &str) -> AppError {
    sink::unsupported(&media::extension(path).unwrap_or_default(), accepted)
}

fn convert_image(config: &PipelineConfig, sink: &Sink, backend: &dyn Backend) -> Result<PipelineStats> {
    let surfaces = decode_file(&config.input, config.return_color, backend)?;

    let (width, height) = surfaces.gray.dimensions();
    let (columns, rows) = target_dimensions(width, height, config.scale)?;
    if let Sink::Raster(_) = sink {
        render::check_grid(columns, rows)?;
    }

    let frame = rasterize(&surfaces, &config.ramp, config.scale, backend)?;
    sink.write_frame(&frame)?;

    Ok(PipelineStats {
        frames_processed: 1,
        replayed_from_cache: false,
    })
}

/// Replays the cached text frames, building the cache first if needed.
fn play_video(config: &PipelineConfig, backend: &dyn Backend) -> Result<PipelineStats> {
    let cache = config.frame_cache()?;

    let cached = if cache.exists() {
        match cache.load() {
            Ok(frames) => Some(frames),
            Err(err @ AppError::CorruptCache { .. }) if backend.capabilities().video => {
                log::warn!("{err}; rebuilding");
                std::fs::remove_file(cache.path())?;
                None
            }
            Err(err @ AppError::CorruptCache { .. }) => {
                return Err(AppError::UnsupportedInput {
                    path: config.input.clone(),
                    reason: format!(
                        "{err}, and the {} backend cannot decode video to rebuild it",
                        backend.name()
                    ),
                });
            }
            Err(err) => return Err(err),
        }
    } else {
        None
    };
    let replayed_from_cache = cached.is_some();

    let frames = match cached {
        Some(frames) => frames,
        None => {
            let source = backend.decode_video_frames(&config.input)?;
            log::info!("building frame cache {}", cache.path().display());
            cache.build(source.map(|frame| {
                frame.and_then(|image| {
                    let surfaces = Surfaces::from_rgb(image, config.return_color);
                    rasterize(&surfaces, &config.ramp, config.scale, backend)
                })
            }))?
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    sink::clear_screen(&mut out)?;
    let frames_processed = Player::new(out, FRAME_INTERVAL).play(&frames)?;

    Ok(PipelineStats {
        frames_processed,
        replayed_from_cache,
    })
}

/// Renders every frame as a glyph image and encodes them into a new video.
fn transcode_video(
    config: &PipelineConfig,
    output: &Path,
    backend: &dyn Backend,
) -> Result<PipelineStats> {
    let frames = backend.decode_video_frames(&config.input)?;
    let metadata = frames.metadata();
    let (columns, rows) = target_dimensions(metadata.width, metadata.height, config.scale)?;
    render::check_grid(columns, rows)?;

    let temp_dir = TempDir::new()?;
    let mut frames_processed = 0;

    for (index, frame) in frames.enumerate() {
        let surfaces = Surfaces::from_rgb(frame?, config.return_color);
        let ascii = rasterize(&surfaces, &config.ramp, config.scale, backend)?;
        render::render_frame(&ascii)?.save(temp_dir.path().join(format!("frame_{index:08}.png")))?;
        frames_processed += 1;
        log::debug!("rendered frame {frames_processed}");
    }

    if frames_processed == 0 {
        return Err(AppError::NoFramesExtracted);
    }

    video::encode_video(temp_dir.path(), &config.input, metadata.fps, output)?;
    log::info!("encoded {frames_processed} frames into {}", output.display());

    Ok(PipelineStats {
        frames_processed,
        replayed_from_cache: false,
    })
}
