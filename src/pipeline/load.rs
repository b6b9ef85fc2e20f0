//! Image loading: turn an [`ImageReference`] into a 3-channel [`PixelBuffer`].
//!
//! Both input forms funnel into the same codec call. The format is sniffed
//! from the content bytes rather than trusted from the extension, and the
//! result is always forced to 8-bit RGB so the decode cascade never has to
//! care whether the source was grayscale, paletted or had an alpha channel.

use crate::config::ACCEPTED_EXTENSIONS;
use crate::error::QrError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the image bytes come from. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// Base64-encoded image bytes, optionally prefixed with a data URL
    /// header such as `data:image/png;base64,`.
    Base64(String),
}

impl ImageReference {
    /// Short description for log lines; never includes the base64 body.
    pub fn describe(&self) -> String {
        match self {
            ImageReference::Path(p) => p.display().to_string(),
            ImageReference::Base64(s) => format!("<base64, {} chars>", s.len()),
        }
    }
}

/// A decoded raster image: height × width × 3 channels, 8 bits each.
///
/// Owned by the single decode call that created it.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn channels(&self) -> u8 {
        3
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }
}

/// Load the referenced image.
pub fn load(reference: &ImageReference) -> Result<PixelBuffer, QrError> {
    match reference {
        ImageReference::Path(path) => load_from_path(path),
        ImageReference::Base64(data) => load_from_base64(data),
    }
}

/// Returns `true` if `path` carries one of the accepted image extensions.
pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Load an image file, validating existence, file type and extension first.
pub fn load_from_path(path: &Path) -> Result<PixelBuffer, QrError> {
    let shown = path.display();

    if !path.exists() {
        return Err(QrError::invalid_image(format!(
            "Image file not found: {shown}"
        )));
    }

    if !path.is_file() {
        return Err(QrError::invalid_image(format!(
            "Path is not a file: {shown}"
        )));
    }

    if !has_accepted_extension(path) {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        return Err(QrError::invalid_image(format!(
            "Unsupported image format: {ext}"
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| QrError::invalid_image_with(format!("Failed to load image: {shown}"), e))?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| QrError::invalid_image_with(format!("Failed to load image: {shown}"), e))?;

    debug!(
        "Loaded {} → {}x{} px ({:?})",
        shown,
        image.width(),
        image.height(),
        image.color()
    );
    Ok(PixelBuffer::new(image.to_rgb8()))
}

/// Decode a base64 payload (optionally wrapped in a data URL) into an image.
pub fn load_from_base64(data: &str) -> Result<PixelBuffer, QrError> {
    let bytes = decode_base64_payload(data).map_err(|e| {
        QrError::invalid_image_with(format!("Failed to process base64 image data: {e}"), e)
    })?;

    let image = image::load_from_memory(&bytes).map_err(|e| {
        QrError::invalid_image_with(format!("Failed to process base64 image data: {e}"), e)
    })?;

    debug!(
        "Decoded base64 payload ({} bytes) → {}x{} px",
        bytes.len(),
        image.width(),
        image.height()
    );
    Ok(PixelBuffer::new(image.to_rgb8()))
}

/// Why a base64 payload could not be turned into bytes.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("data URL has no ',' separating the header from the payload")]
    MissingComma,
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Strip an optional `data:...,` header and decode the rest as standard base64.
///
/// ASCII whitespace anywhere in the payload is ignored, so line-wrapped
/// (MIME-style) base64 is accepted.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>, PayloadError> {
    let body = strip_data_url_prefix(data.trim())?;
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Return the part after the first comma when `data` starts with `data:`.
fn strip_data_url_prefix(data: &str) -> Result<&str, PayloadError> {
    if !data.starts_with("data:") {
        return Ok(data);
    }
    data.split_once(',')
        .map(|(_, body)| body)
        .ok_or(PayloadError::MissingComma)
}
