use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("input file does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("scale must be larger than 0, got {0}")]
    InvalidScale(f64),

    #[error("glyph ramp must contain at least one character")]
    EmptyRamp,

    #[error("glyph ramp cannot contain control character {0:?}")]
    ControlGlyph(char),

    #[error("rasterized frame is empty; increase --scale")]
    EmptyFrame,

    #[error("unsupported output format `{extension}`; accepted: {accepted}")]
    UnsupportedFormat { extension: String, accepted: String },

    #[error("cannot read `{path}`: {reason}")]
    UnsupportedInput { path: PathBuf, reason: String },

    #[error("canvas {width}x{height} exceeds the {max}px limit of the glyph renderer")]
    CanvasTooLarge { width: u64, height: u64, max: u32 },

    #[error("a {columns}x{rows} glyph grid exceeds the limit of {max_cells} cells; lower --scale")]
    GridTooLarge { columns: u64, rows: u64, max_cells: u64 },

    #[error("failed to run command `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{program}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to read video metadata from `{path}`: {reason}")]
    MetadataParse { path: PathBuf, reason: String },

    #[error("no frames were extracted from the input video")]
    NoFramesExtracted,

    #[error("frame cache `{path}` is corrupt: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
