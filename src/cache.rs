//! On-disk cache of rasterized video frames.
//!
//! Layout: the first line is the number of text rows per frame, followed by
//! every frame's rows in order. Nothing else marks frame boundaries.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ascii::Frame;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCache {
    path: PathBuf,
}

impl FrameCache {
    /// Cache for `source` rendered with `params`, named
    /// `<source>.<fingerprint>.temp`.
    pub fn for_source(source: &Path, params: &str) -> Result<Self> {
        let digest = fingerprint(source, params)?;
        let mut name = source.as_os_str().to_owned();
        name.push(format!(".{digest}.temp"));
        Ok(Self::at(PathBuf::from(name)))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes each frame as it arrives and returns their text in order.
    ///
    /// The file only appears at its final path once complete, and an
    /// existing cache is never overwritten.
    pub fn build<I>(&self, frames: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = Result<Frame>>,
    {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let partial = tempfile::Builder::new()
            .prefix(".frame-cache-")
            .suffix(".partial")
            .tempfile_in(dir)?;
        let mut writer = BufWriter::new(partial);

        let mut texts = Vec::new();
        let mut rows_per_frame = None;

        for frame in frames {
            let frame = frame?;
            // Zero rows leave nothing to mark frame boundaries on replay.
            if frame.height() == 0 {
                return Err(AppError::EmptyFrame);
            }
            match rows_per_frame {
                None => {
                    writeln!(writer, "{}", frame.height())?;
                    rows_per_frame = Some(frame.height());
                }
                Some(rows) if rows != frame.height() => {
                    return Err(self.corrupt(format!(
                        "frame {} has {} rows, expected {rows}",
                        texts.len() + 1,
                        frame.height()
                    )));
                }
                Some(_) => {}
            }

            let text = frame.to_ansi();
            writer.write_all(text.as_bytes())?;
            log::debug!("cached frame {}", texts.len() + 1);
            texts.push(text);
        }

        if texts.is_empty() {
            return Err(AppError::NoFramesExtracted);
        }

        let partial = writer.into_inner().map_err(|err| err.into_error())?;
        match partial.persist_noclobber(&self.path) {
            Ok(_) => log::info!("cached {} frames in {}", texts.len(), self.path.display()),
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
                log::warn!(
                    "{} was written by another process; keeping it",
                    self.path.display()
                );
            }
            Err(err) => return Err(err.error.into()),
        }

        Ok(texts)
    }

    pub fn load(&self) -> Result<Vec<String>> {
        let file = File::open(&self.path)?;
        let frames = segment_frames(BufReader::new(file), &self.path)?;
        log::info!("loaded {} frames from {}", frames.len(), self.path.display());
        Ok(frames)
    }

    fn corrupt(&self, reason: String) -> AppError {
        AppError::CorruptCache {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Splits a cache stream into frames using its row-count header.
pub fn segment_frames<R: BufRead>(reader: R, path: &Path) -> Result<Vec<String>> {
    let corrupt = |reason: String| AppError::CorruptCache {
        path: path.to_path_buf(),
        reason,
    };

    let mut lines = reader.lines();
    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| corrupt("missing frame height header".to_string()))?;
    let rows: usize = header
        .trim()
        .parse()
        .map_err(|_| corrupt(format!("invalid frame height header `{header}`")))?;

    let mut frames = Vec::new();
    let mut buffer = String::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        if rows == 0 {
            return Err(corrupt("rows found after a zero frame height".to_string()));
        }
        buffer.push_str(&line);
        buffer.push('\n');
        if (index + 1) % rows == 0 {
            frames.push(std::mem::take(&mut buffer));
        }
    }

    if !buffer.is_empty() {
        return Err(corrupt(format!("trailing partial frame of {} bytes", buffer.len())));
    }
    Ok(frames)
}

/// First 8 bytes of SHA-256 over the source bytes and render parameters.
pub fn fingerprint(source: &Path, params: &str) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut file = File::open(source)?;
    io::copy(&mut file, &mut hasher)?;
    hasher.update(params.as_bytes());
    Ok(hex::encode(&hasher.finalize()[..8]))
}
