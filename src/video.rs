use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Output, Stdio};

use image::RgbImage;

use crate::error::{AppError, Result};
use crate::media;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

pub fn tools_available() -> bool {
    responds("ffmpeg") && responds("ffprobe")
}

pub fn read_metadata(input: &Path) -> Result<VideoMetadata> {
    if media::extension(input).as_deref() == Some("yuv") {
        return Err(AppError::UnsupportedInput {
            path: input.to_path_buf(),
            reason: "raw .yuv carries no frame size or pixel format; remux it first, \
                     e.g. `ffmpeg -s WxH -pix_fmt yuv420p -i in.yuv out.mp4`"
                .to_string(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(input)
        .output()
        .map_err(spawn_error("ffprobe"))?;

    check_status("ffprobe", &output)?;
    parse_stream_report(input, &String::from_utf8_lossy(&output.stdout))
}

/// Reads `key=value` lines from ffprobe's default writer.
fn parse_stream_report(input: &Path, report: &str) -> Result<VideoMetadata> {
    let fail = |reason: String| AppError::MetadataParse {
        path: input.to_path_buf(),
        reason,
    };

    let (mut width, mut height, mut rate) = (None, None, None);
    for line in report.lines() {
        match line.trim().split_once('=') {
            Some(("width", value)) => width = Some(value),
            Some(("height", value)) => height = Some(value),
            Some(("r_frame_rate", value)) => rate = Some(value),
            _ => {}
        }
    }

    let side = |name: &str, value: Option<&str>| -> Result<u32> {
        let value = value.ok_or_else(|| fail(format!("no video stream {name} reported")))?;
        match value.parse::<u32>() {
            Ok(side) if side > 0 => Ok(side),
            _ => Err(fail(format!("unusable {name} `{value}`"))),
        }
    };
    let width = side("width", width)?;
    let height = side("height", height)?;

    let rate = rate.ok_or_else(|| fail("no frame rate reported".to_string()))?;
    let fps = parse_frame_rate(rate).ok_or_else(|| fail(format!("unusable frame rate `{rate}`")))?;

    Ok(VideoMetadata { width, height, fps })
}

/// Decoded frames of a video, pulled one at a time from an ffmpeg
/// `rawvideo` pipe. Forward-only: once exhausted it stays exhausted, and
/// dropping it stops the decoder.
pub struct VideoFrames {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    metadata: VideoMetadata,
    frame_len: usize,
    exhausted: bool,
}

impl VideoFrames {
    pub fn open(input: &Path) -> Result<Self> {
        let metadata = read_metadata(input)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(input)
            .args(["-an", "-fps_mode", "passthrough", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error("ffmpeg"))?;
        let stdout = child.stdout.take();

        log::debug!(
            "decoding {} at {}x{} @ {:.3}fps",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        );

        Ok(Self {
            child: Some(child),
            stdout,
            frame_len: metadata.width as usize * metadata.height as usize * 3,
            metadata,
            exhausted: false,
        })
    }

    pub fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn finish(&mut self) -> Option<Result<RgbImage>> {
        self.exhausted = true;
        self.stdout = None;
        let mut child = self.child.take()?;
        match child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Err(AppError::CommandFailed {
                program: "ffmpeg".to_string(),
                code: status.code(),
                stderr: "video decode stream ended early".to_string(),
            })),
            Err(err) => Some(Err(err.into())),
        }
    }
}

impl Iterator for VideoFrames {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return self.finish();
        };

        let mut buffer = vec![0u8; self.frame_len];
        match stdout.read_exact(&mut buffer) {
            Ok(()) => RgbImage::from_raw(self.metadata.width, self.metadata.height, buffer)
                .map(Ok)
                .or_else(|| self.finish()),
            // A trailing partial frame is dropped along with the end of stream.
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => self.finish(),
            Err(err) => {
                let _ = self.finish();
                Some(Err(err.into()))
            }
        }
    }
}

impl FusedIterator for VideoFrames {}

impl Drop for VideoFrames {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Decodes the first frame of anything ffmpeg can read, such as still
/// formats the `image` crate has no decoder for.
pub fn decode_still(input: &Path) -> Result<RgbImage> {
    VideoFrames::open(input)?
        .next()
        .unwrap_or(Err(AppError::NoFramesExtracted))
}

pub fn encode_video(frames_dir: &Path, source_video: &Path, fps: f64, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let frame_pattern = frames_dir.join("frame_%08d.png");
    let fps_string = format!("{fps:.6}");

    let output_cmd = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-framerate"])
        .arg(&fps_string)
        .arg("-i")
        .arg(&frame_pattern)
        .arg("-i")
        .arg(source_video)
        .args([
            "-map",
            "0:v:0",
            "-map",
            "1:a?",
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-crf",
            "18",
            "-pix_fmt",
            "yuv420p",
            "-tune",
            "stillimage",
            "-c:a",
            "copy",
            "-shortest",
        ])
        .arg(output)
        .output()
        .map_err(spawn_error("ffmpeg"))?;

    check_status("ffmpeg", &output_cmd)
}

pub fn create_test_video(
    output: &Path,
    width: u32,
    height: u32,
    fps: u32,
    duration_seconds: f32,
) -> Result<()> {
    let size = format!("{width}x{height}");
    let rate = fps.to_string();
    let duration = format!("{duration_seconds}");

    let output_cmd = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!(
            "testsrc=size={size}:rate={rate}:duration={duration}"
        ))
        .args(["-pix_fmt", "yuv420p"])
        .arg(output)
        .output()
        .map_err(spawn_error("ffmpeg"))?;

    check_status("ffmpeg", &output_cmd)
}

/// Frame rate from ffprobe's `num/den` form or a plain number.
fn parse_frame_rate(value: &str) -> Option<f64> {
    let (num, den) = value.split_once('/').unwrap_or((value, "1"));
    let fps = num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn spawn_error(program: &'static str) -> impl FnOnce(std::io::Error) -> AppError {
    move |source| AppError::CommandSpawn {
        program: program.to_string(),
        source,
    }
}

fn check_status(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(AppError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Whether `program -version` runs cleanly.
fn responds(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
