//! Advisory pre-flight checks for image files.
//!
//! [`is_safe`] never fails: any problem reading the file, its metadata or
//! its header yields `false`. Only the header is parsed for the dimension
//! check, so oversized images are rejected before a full decode is paid for.
//!
//! The decode path does not call this on its own; enable
//! [`crate::ReaderConfig::safety_check`] or call it directly.

use crate::config::ReaderConfig;
use std::path::Path;
use tracing::{error, warn};

/// Check `path` against the default limits (50 MiB, 10 000 px per axis).
pub fn is_safe(path: impl AsRef<Path>) -> bool {
    is_safe_with(path, &ReaderConfig::default())
}

/// Check `path` against the limits in `config`.
///
/// Checks run in order and stop at the first violation:
/// 1. file size > `max_file_bytes` → `false`
/// 2. width or height > `max_dimension` → `false`
pub fn is_safe_with(path: impl AsRef<Path>, config: &ReaderConfig) -> bool {
    let path = path.as_ref();

    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            error!("Image validation failed for {}: {}", path.display(), e);
            return false;
        }
    };
    if size > config.max_file_bytes {
        warn!("Image file too large: {} bytes ({})", size, path.display());
        return false;
    }

    let (width, height) = match header_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            error!("Image validation failed for {}: {}", path.display(), e);
            return false;
        }
    };
    if width > config.max_dimension || height > config.max_dimension {
        warn!(
            "Image dimensions too large: {}x{} ({})",
            width,
            height,
            path.display()
        );
        return false;
    }

    true
}

/// Read `(width, height)` from the image header, sniffing the format from
/// the content rather than the extension.
fn header_dimensions(path: &Path) -> image::ImageResult<(u32, u32)> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn missing_file_is_unsafe() {
        assert!(!is_safe("/no/such/image.png"));
    }

    #[test]
    fn small_image_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        GrayImage::from_pixel(32, 32, Luma([255])).save(&path).unwrap();
        assert!(is_safe(&path));
    }

    #[test]
    fn garbage_file_is_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"\x00\x01\x02 not an image").unwrap();
        assert!(!is_safe(&path));
    }

    #[test]
    fn custom_limits_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        GrayImage::from_pixel(65, 2, Luma([0])).save(&path).unwrap();

        let strict = ReaderConfig::builder().max_dimension(64).build().unwrap();
        assert!(!is_safe_with(&path, &strict));

        let tiny = ReaderConfig::builder().max_file_bytes(8).build().unwrap();
        assert!(!is_safe_with(&path, &tiny));

        assert!(is_safe_with(&path, &ReaderConfig::default()));
    }
}
