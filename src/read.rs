//! Request orchestration: one image reference in, one payload (or typed
//! failure) out.
//!
//! Loading and detection are CPU-bound, so the async entry points move them
//! onto tokio's blocking pool with `spawn_blocking`. That keeps the runtime's
//! worker threads free to serve other requests while one image is decoded.
//! No state is shared between calls: each request owns its pixel buffer and
//! nothing is cached.

use crate::config::ReaderConfig;
use crate::error::QrError;
use crate::pipeline::decode::decode_detailed;
use crate::pipeline::detect::{QrDetector, RqrrDetector};
use crate::pipeline::load::{load, ImageReference};
use crate::safety::is_safe_with;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Message for a request that carries neither input.
pub const MISSING_INPUT: &str = "Either image_path or image_data must be provided";

/// Message for a request that carries both inputs.
pub const CONFLICTING_INPUT: &str = "Provide only one of image_path or image_data";

const LOG_PREVIEW_CHARS: usize = 50;

/// Turn the two optional request fields into an [`ImageReference`].
///
/// Empty strings count as absent. Zero or two inputs is `InvalidArgument`.
pub fn reference_from_args(
    image_path: Option<&str>,
    image_data: Option<&str>,
) -> Result<ImageReference, QrError> {
    let image_path = image_path.filter(|s| !s.is_empty());
    let image_data = image_data.filter(|s| !s.is_empty());

    match (image_path, image_data) {
        (Some(path), None) => Ok(ImageReference::Path(path.into())),
        (None, Some(data)) => Ok(ImageReference::Base64(data.to_string())),
        (None, None) => Err(QrError::invalid_argument(MISSING_INPUT)),
        (Some(_), Some(_)) => Err(QrError::invalid_argument(CONFLICTING_INPUT)),
    }
}

/// Read and decode a QR code from a file path or base64 image data.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - `InvalidArgument`: neither (or both) of `image_path` / `image_data` given
/// - `InvalidImage`: the image could not be loaded or processed
/// - `NotFound`: the image is fine but holds no readable QR code
///
/// # Example
/// ```rust,no_run
/// # async fn run() -> Result<(), qr_code_reader::QrError> {
/// let payload = qr_code_reader::read_qr(Some("ticket.png"), None).await?;
/// println!("{payload}");
/// # Ok(())
/// # }
/// ```
pub async fn read_qr(image_path: Option<&str>, image_data: Option<&str>) -> Result<String, QrError> {
    let reference = reference_from_args(image_path, image_data)?;
    read_qr_with(reference, &ReaderConfig::default()).await
}

/// Read a QR code from a typed reference using the default `rqrr` detector.
pub async fn read_qr_with(
    reference: ImageReference,
    config: &ReaderConfig,
) -> Result<String, QrError> {
    read_qr_using(reference, config, Arc::new(RqrrDetector::new())).await
}

/// Read a QR code with a caller-supplied detector.
///
/// The blocking work runs in `spawn_blocking`; a panic inside it surfaces
/// as `InvalidImage` rather than tearing down the caller.
pub async fn read_qr_using(
    reference: ImageReference,
    config: &ReaderConfig,
    detector: Arc<dyn QrDetector>,
) -> Result<String, QrError> {
    let config = config.clone();

    tokio::task::spawn_blocking(move || read_qr_blocking(&reference, &config, detector.as_ref()))
        .await
        .map_err(|e| {
            error!("Decode task failed: {}", e);
            QrError::invalid_image(format!("Decode task failed: {e}"))
        })?
}

/// Synchronous version of [`read_qr_using`] for callers outside a runtime.
///
/// A panic while loading or decoding is caught and reported as
/// `InvalidImage`, same as on the async path.
pub fn read_qr_blocking(
    reference: &ImageReference,
    config: &ReaderConfig,
    detector: &dyn QrDetector,
) -> Result<String, QrError> {
    let start = Instant::now();
    let source = reference.describe();
    debug!("Reading QR code from {}", source);

    if config.safety_check {
        if let ImageReference::Path(path) = reference {
            if !is_safe_with(path, config) {
                return Err(log_failure(QrError::invalid_image(format!(
                    "Image failed safety validation: {}",
                    path.display()
                ))));
            }
        }
    }

    let decoded = panic::catch_unwind(AssertUnwindSafe(|| {
        let buffer = load(reference)?;
        decode_detailed(&buffer, detector)
    }))
    .unwrap_or_else(|payload| {
        Err(QrError::invalid_image(format!(
            "Unexpected failure while decoding: {}",
            panic_message(payload.as_ref())
        )))
    })
    .map_err(log_failure)?
    .ok_or(QrError::NotFound)?;

    info!(
        "Successfully decoded QR code via {} in {}ms: {}",
        decoded.strategy,
        start.elapsed().as_millis(),
        preview(&decoded.payload)
    );
    Ok(decoded.payload)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic")
}

fn log_failure(e: QrError) -> QrError {
    error!("Error processing image: {}", e);
    e
}

/// First few characters of a payload, for log lines.
fn preview(payload: &str) -> String {
    let mut chars = payload.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
