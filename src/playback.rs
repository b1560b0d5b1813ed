use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::error::Result;

/// Pause between replayed frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(15);

pub const CURSOR_HOME: &str = "\x1b[H";

/// Writes pre-rendered frames at a fixed cadence. Blocks until every frame
/// has been shown.
pub struct Player<W: Write> {
    out: W,
    interval: Duration,
}

impl<W: Write> Player<W> {
    pub fn new(out: W, interval: Duration) -> Self {
        Self { out, interval }
    }

    pub fn play(&mut self, frames: &[String]) -> Result<usize> {
        for (index, frame) in frames.iter().enumerate() {
            self.out.write_all(frame.as_bytes())?;
            self.out.flush()?;
            self.out.write_all(CURSOR_HOME.as_bytes())?;
            log::trace!("showed frame {}/{}", index + 1, frames.len());
            thread::sleep(self.interval);
        }
        self.out.flush()?;
        Ok(frames.len())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
