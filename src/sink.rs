//! Output sinks, selected by the destination's extension.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};

use crate::ascii::Frame;
use crate::error::{AppError, Result};
use crate::media::{self, VIDEO_EXTENSIONS};
use crate::ramp::hex_color;
use crate::render;

pub const TEXT_EXTENSIONS: &[&str] = &["txt"];
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg"];
pub const MARKUP_EXTENSIONS: &[&str] = &["html"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Clear the screen and write to standard output.
    Terminal,
    Text(PathBuf),
    Raster(PathBuf),
    Markup { path: PathBuf, background: String },
    Video(PathBuf),
}

impl Sink {
    pub fn for_output(output: Option<&Path>, html_bg_color: &str) -> Result<Self> {
        let Some(path) = output else {
            return Ok(Self::Terminal);
        };
        let extension = media::extension(path).unwrap_or_default();
        let path = path.to_path_buf();

        let sink = match extension.as_str() {
            ext if TEXT_EXTENSIONS.contains(&ext) => Self::Text(path),
            ext if RASTER_EXTENSIONS.contains(&ext) => Self::Raster(path),
            ext if MARKUP_EXTENSIONS.contains(&ext) => Self::Markup {
                path,
                background: html_bg_color.to_string(),
            },
            ext if VIDEO_EXTENSIONS.contains(&ext) => Self::Video(path),
            _ => return Err(unsupported(&extension, &accepted_outputs())),
        };
        Ok(sink)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    /// Writes a single frame. Video destinations take a frame sequence and
    /// are rejected here.
    pub fn write_frame(&self, frame: &Frame) -> Result<()> {
        match self {
            Self::Terminal => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                clear_screen(&mut out)?;
                write_terminal(frame, &mut out)?;
                out.flush()?;
            }
            Self::Text(path) => {
                let mut out = BufWriter::new(File::create(path)?);
                write_text(frame, &mut out)?;
                out.flush()?;
            }
            Self::Raster(path) => {
                let canvas = render::render_frame(frame)?;
                canvas.save(path)?;
            }
            Self::Markup { path, background } => {
                let mut out = BufWriter::new(File::create(path)?);
                write_markup(frame, background, &mut out)?;
                out.flush()?;
            }
            Self::Video(path) => {
                let extension = media::extension(path).unwrap_or_default();
                return Err(unsupported(&extension, &accepted_image_outputs()));
            }
        }
        log::info!("wrote {}x{} frame to {self:?}", frame.width(), frame.height());
        Ok(())
    }
}

pub fn accepted_outputs() -> String {
    media::describe(&[TEXT_EXTENSIONS, RASTER_EXTENSIONS, MARKUP_EXTENSIONS, VIDEO_EXTENSIONS].concat())
}

pub fn accepted_image_outputs() -> String {
    media::describe(&[TEXT_EXTENSIONS, RASTER_EXTENSIONS, MARKUP_EXTENSIONS].concat())
}

pub fn accepted_video_outputs() -> String {
    format!("{} or no output (terminal playback)", media::describe(VIDEO_EXTENSIONS))
}

pub(crate) fn unsupported(extension: &str, accepted: &str) -> AppError {
    AppError::UnsupportedFormat {
        extension: if extension.is_empty() {
            "<none>".to_string()
        } else {
            format!(".{extension}")
        },
        accepted: accepted.to_string(),
    }
}

pub fn write_text<W: Write>(frame: &Frame, out: &mut W) -> io::Result<()> {
    out.write_all(frame.to_text().as_bytes())
}

pub fn write_terminal<W: Write>(frame: &Frame, out: &mut W) -> io::Result<()> {
    out.write_all(frame.to_ansi().as_bytes())
}

pub fn write_markup<W: Write>(frame: &Frame, background: &str, out: &mut W) -> io::Result<()> {
    write!(
        out,
        "<html><head><title>ASCII ART</title></head><body bgcolor=\"{}\">",
        escape_html(background)
    )?;

    if frame.has_color() {
        out.write_all(b"<pre align=\"left\">\n")?;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let color = frame.color(x, y).map(hex_color).unwrap_or_default();
                write!(
                    out,
                    "<span style=\"color:{color};\">{}</span>",
                    escape_glyph(frame.glyph(x, y))
                )?;
            }
            out.write_all(b"<br>")?;
        }
        out.write_all(b"</pre>\n")?;
    } else {
        for y in 0..frame.height() {
            let line: String = frame.row(y).iter().map(|&ch| escape_glyph(ch)).collect();
            writeln!(out, "<pre align=\"left\">{line}</pre>")?;
        }
    }

    out.write_all(b"</body>\n</html>")
}

fn escape_glyph(ch: char) -> String {
    match ch {
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '&' => "&amp;".to_string(),
        '"' => "&quot;".to_string(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.chars().map(escape_glyph).collect()
}

pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    crossterm::execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}
