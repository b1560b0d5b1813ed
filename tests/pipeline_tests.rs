use image::{GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;

use media_ascii_cli::ascii::rasterize_file;
use media_ascii_cli::backend::{self, Method};
use media_ascii_cli::cache::FrameCache;
use media_ascii_cli::error::AppError;
use media_ascii_cli::pipeline::{PipelineConfig, run};
use media_ascii_cli::ramp::GlyphRamp;
use media_ascii_cli::video::{self, VideoFrames};

fn skip_if_no_ffmpeg() -> bool {
    if !video::tools_available() {
        eprintln!("Skipping ffmpeg-dependent test: ffmpeg/ffprobe not available.");
        true
    } else {
        false
    }
}

fn black_photo(temp: &TempDir) -> std::path::PathBuf {
    let path = temp.path().join("photo.png");
    GrayImage::from_pixel(2, 2, Luma([0]))
        .save(&path)
        .expect("save fixture");
    path
}

#[test]
fn black_image_renders_to_text_file() {
    let temp = TempDir::new().expect("temp dir");
    let output = temp.path().join("photo.txt");

    let mut config = PipelineConfig::new(black_photo(&temp));
    config.output = Some(output.clone());
    config.ramp = GlyphRamp::new("@ ").expect("ramp");

    let stats = run(&config).expect("run pipeline");

    assert_eq!(stats.frames_processed, 1);
    assert_eq!(std::fs::read_to_string(&output).expect("read"), "@@\n@@\n");
}

#[test]
fn zero_scale_fails_without_creating_output() {
    let temp = TempDir::new().expect("temp dir");
    let output = temp.path().join("photo.txt");

    let mut config = PipelineConfig::new(black_photo(&temp));
    config.output = Some(output.clone());
    config.scale = 0.0;

    assert!(matches!(run(&config), Err(AppError::InvalidScale(_))));
    assert!(!output.exists());
}

#[test]
fn gif_output_is_unsupported() {
    let temp = TempDir::new().expect("temp dir");
    let output = temp.path().join("photo.gif");

    let mut config = PipelineConfig::new(black_photo(&temp));
    config.output = Some(output.clone());

    let err = run(&config).unwrap_err();
    assert!(matches!(err, AppError::UnsupportedFormat { .. }));
    let message = err.to_string();
    assert!(message.contains(".txt") && message.contains(".html") && message.contains(".png"));
    assert!(!output.exists());
}

#[test]
fn huge_scale_reports_resource_limits_instead_of_allocating() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("square.png");
    GrayImage::from_pixel(10, 10, Luma([0]))
        .save(&input)
        .expect("save fixture");

    let mut config = PipelineConfig::new(input);
    config.scale = 1e9;

    config.output = Some(temp.path().join("out.png"));
    assert!(matches!(
        run(&config),
        Err(AppError::GridTooLarge { .. } | AppError::CanvasTooLarge { .. })
    ));

    // Within the cell budget but wider than the glyph canvas allows.
    config.scale = 300.0;
    assert!(matches!(run(&config), Err(AppError::CanvasTooLarge { .. })));
    assert!(!temp.path().join("out.png").exists());

    config.scale = 1e9;
    config.output = Some(temp.path().join("out.txt"));
    assert!(matches!(run(&config), Err(AppError::GridTooLarge { .. })));
    assert!(!temp.path().join("out.txt").exists());
}

#[test]
fn missing_input_is_not_found() {
    let temp = TempDir::new().expect("temp dir");
    let mut config = PipelineConfig::new(temp.path().join("missing.png"));
    config.output = Some(temp.path().join("out.txt"));

    assert!(matches!(run(&config), Err(AppError::InputNotFound(_))));
    assert!(!temp.path().join("out.txt").exists());
}

#[test]
fn unknown_input_kind_is_unsupported() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("notes.doc");
    std::fs::write(&input, b"not media").expect("write");

    let mut config = PipelineConfig::new(input);
    config.output = Some(temp.path().join("out.txt"));

    assert!(matches!(run(&config), Err(AppError::UnsupportedInput { .. })));
}

#[test]
fn image_to_video_output_is_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let mut config = PipelineConfig::new(black_photo(&temp));
    config.output = Some(temp.path().join("photo.mp4"));

    assert!(matches!(run(&config), Err(AppError::UnsupportedFormat { .. })));
}

#[test]
fn colored_image_renders_to_html() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("red.png");
    RgbImage::from_pixel(3, 2, Rgb([200, 16, 0]))
        .save(&input)
        .expect("save fixture");
    let output = temp.path().join("red.html");

    let mut config = PipelineConfig::new(input);
    config.output = Some(output.clone());
    config.return_color = true;
    config.html_bg_color = "navy".to_string();

    run(&config).expect("run pipeline");

    let html = std::fs::read_to_string(&output).expect("read");
    assert!(html.contains("bgcolor=\"navy\""));
    assert_eq!(html.matches("color:#c81000;").count(), 6);
    assert_eq!(html.matches("<br>").count(), 2);
}

#[test]
fn image_renders_to_png_canvas() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("gradient.png");
    GrayImage::from_fn(16, 8, |x, _| Luma([(x * 16) as u8]))
        .save(&input)
        .expect("save fixture");
    let output = temp.path().join("gradient_ascii.png");

    let mut config = PipelineConfig::new(input);
    config.output = Some(output.clone());
    config.scale = 0.5;

    run(&config).expect("run pipeline");

    let canvas = image::open(&output).expect("open output").to_rgb8();
    assert_eq!(canvas.dimensions(), (8 * 8, 4 * 8));
}

#[test]
fn rasterized_grid_matches_scaled_size() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("wide.bmp");
    GrayImage::from_pixel(9, 5, Luma([128]))
        .save(&input)
        .expect("save fixture");
    let backend = backend::init(Method::Pillow);

    let frame = rasterize_file(&input, &GlyphRamp::default(), 0.7, false, backend.as_ref())
        .expect("rasterize");

    // 9 * 0.7 = 6.3, 5 * 0.7 = 3.5
    assert_eq!((frame.width(), frame.height()), (6, 3));
}

#[test]
fn video_without_decoder_or_cache_is_unsupported() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("clip.mp4");
    std::fs::write(&input, b"not decoded by pillow").expect("write");

    let config = PipelineConfig::new(input);

    assert!(matches!(run(&config), Err(AppError::UnsupportedInput { .. })));
}

#[test]
fn corrupt_cache_without_decoder_is_unsupported() {
    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("clip.mp4");
    std::fs::write(&input, b"not decoded by pillow").expect("write");

    let config = PipelineConfig::new(input);
    let cache = config.frame_cache().expect("cache path");
    std::fs::write(cache.path(), "abc\n").expect("write cache");

    let err = run(&config).unwrap_err();
    assert!(matches!(err, AppError::UnsupportedInput { .. }), "{err:?}");
    assert!(err.to_string().contains("corrupt"));
}

#[test]
fn video_frames_stream_until_exhausted() {
    if skip_if_no_ffmpeg() {
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("input.mp4");
    video::create_test_video(&input, 32, 24, 3, 1.0).expect("create test video");

    let mut frames = VideoFrames::open(&input).expect("open video");
    assert_eq!(frames.metadata().width, 32);
    assert_eq!(frames.metadata().height, 24);

    let mut count = 0;
    for frame in frames.by_ref() {
        assert_eq!(frame.expect("frame").dimensions(), (32, 24));
        count += 1;
    }
    assert_eq!(count, 3);
    assert!(frames.is_exhausted());
    assert!(frames.next().is_none());
}

#[test]
fn video_cache_replays_fresh_frames() {
    if skip_if_no_ffmpeg() {
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("input.mp4");
    video::create_test_video(&input, 16, 16, 3, 1.0).expect("create test video");

    let mut config = PipelineConfig::new(input.clone());
    config.method = Method::Opencv;
    config.scale = 0.25;

    let built = run(&config).expect("build and play");
    assert!(!built.replayed_from_cache);
    assert_eq!(built.frames_processed, 3);

    // The cache alone is enough to replay, even without a video decoder.
    config.method = Method::Pillow;
    let replayed = run(&config).expect("replay");
    assert!(replayed.replayed_from_cache);
    assert_eq!(replayed.frames_processed, 3);

    let caches: Vec<_> = std::fs::read_dir(temp.path())
        .expect("read dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "temp"))
        .collect();
    assert_eq!(caches.len(), 1);
    let frames = FrameCache::at(caches[0].clone()).load().expect("load cache");
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|frame| frame.lines().count() == 4));
}

#[test]
fn video_transcodes_to_ascii_video() {
    if skip_if_no_ffmpeg() {
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let input = temp.path().join("input.mp4");
    let output = temp.path().join("output_ascii.mp4");
    video::create_test_video(&input, 80, 60, 6, 1.0).expect("create test video");

    let mut config = PipelineConfig::new(input);
    config.output = Some(output.clone());
    config.method = Method::Opencv;
    config.scale = 0.25;

    let stats = run(&config).expect("run pipeline");

    assert!(output.exists());
    assert_eq!(stats.frames_processed, 6);

    // 80x60 at 0.25 → 20x15 cells of 8px each
    let output_meta = video::read_metadata(&output).expect("read output metadata");
    assert_eq!(output_meta.width, 160);
    assert_eq!(output_meta.height, 120);
    assert!((output_meta.fps - 6.0).abs() < 0.2);
}
