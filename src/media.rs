use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "bmp", "pbm", "pgm", "ppm", "sr", "ras", "tiff", "tif", "jpeg",
];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "yuv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    pub fn classify(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Self::Image,
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => Self::Video,
            _ => Self::Unknown,
        }
    }
}

/// Lowercased extension without the leading dot.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Renders extensions as `.a, .b, .c` for error messages.
pub fn describe(extensions: &[&str]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(MediaKind::classify(Path::new("photo.png")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("scan.TIF")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("old.ras")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("clip.mp4")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("raw.yuv")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("anim.gif")), MediaKind::Unknown);
        assert_eq!(MediaKind::classify(Path::new("README")), MediaKind::Unknown);
    }

    #[test]
    fn describes_extension_sets() {
        assert_eq!(describe(VIDEO_EXTENSIONS), ".mp4, .avi, .yuv");
    }
}
