//! The decode cascade: five detection strategies, first non-empty result wins.
//!
//! The raw detector is brittle against sensor noise, uneven lighting and busy
//! backgrounds. Cheap deterministic preprocessing variants recover a good
//! share of those codes without a second detection algorithm.
//!
//! ```text
//! color ─┬─ 1. multi-code  ─┐
//!        ├─ 2. single-code  │
//!        └─ gray ─┬─ 3. single-code
//!                 ├─ blur 5×5 ── 4. single-code
//!                 └─ otsu ────── 5. single-code ──▶ first non-empty | None
//! ```
//!
//! Steps share no state: 4 and 5 are both derived from the step-3 grayscale
//! image, never from each other's output. A detector that reports success
//! with an empty payload counts as a miss.
//!
//! With [`RqrrDetector`](crate::pipeline::detect::RqrrDetector), steps 2 and
//! 3 cannot succeed once step 1 has failed: `rqrr` only sees intensities, a
//! color frame is reduced with the same luma as [`to_grayscale`], and
//! `detect_single` is the first grid of the multi-code pass. An image with no
//! code therefore pays for two redundant `rqrr` passes. The steps stay so
//! that detectors which do use color, or which find a single code differently
//! from several, get every attempt.

use crate::error::QrError;
use crate::pipeline::detect::{DetectorError, Frame, QrDetector};
use crate::pipeline::load::PixelBuffer;
use crate::pipeline::preprocess::{gaussian_blur_5x5, otsu_binarize, to_grayscale};
use std::fmt;
use tracing::debug;

/// One step of the cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MultiColor,
    SingleColor,
    SingleGray,
    SingleBlurredGray,
    SingleOtsu,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::MultiColor,
        Strategy::SingleColor,
        Strategy::SingleGray,
        Strategy::SingleBlurredGray,
        Strategy::SingleOtsu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::MultiColor => "multi_color",
            Strategy::SingleColor => "single_color",
            Strategy::SingleGray => "single_gray",
            Strategy::SingleBlurredGray => "single_blur",
            Strategy::SingleOtsu => "single_otsu",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A successful decode together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub payload: String,
    pub strategy: Strategy,
}

/// Run the cascade and return the first non-empty payload, or `None`.
///
/// # Errors
/// `InvalidImage` if the detector itself fails. "Nothing found" is never an
/// error at this level.
pub fn decode(buffer: &PixelBuffer, detector: &dyn QrDetector) -> Result<Option<String>, QrError> {
    Ok(decode_detailed(buffer, detector)?.map(|d| d.payload))
}

/// Like [`decode`], but also reports which strategy succeeded.
pub fn decode_detailed(
    buffer: &PixelBuffer,
    detector: &dyn QrDetector,
) -> Result<Option<Decoded>, QrError> {
    let color = buffer.as_rgb();

    // ── Steps 1–2: color buffer ──────────────────────────────────────────
    let multi = detector
        .detect_multi(Frame::Color(color))
        .map_err(|e| detector_failure(Strategy::MultiColor, e))?;
    if let Some(found) = multi.into_iter().find(|s| !s.is_empty()) {
        return Ok(Some(hit(Strategy::MultiColor, found)));
    }
    debug!("{}: no payload", Strategy::MultiColor);

    if let Some(found) = single(detector, Strategy::SingleColor, Frame::Color(color))? {
        return Ok(Some(found));
    }

    // ── Steps 3–5: grayscale variants ────────────────────────────────────
    let gray = to_grayscale(color);
    if let Some(found) = single(detector, Strategy::SingleGray, Frame::Gray(&gray))? {
        return Ok(Some(found));
    }

    let blurred = gaussian_blur_5x5(&gray);
    if let Some(found) = single(detector, Strategy::SingleBlurredGray, Frame::Gray(&blurred))? {
        return Ok(Some(found));
    }

    let binary = otsu_binarize(&gray);
    if let Some(found) = single(detector, Strategy::SingleOtsu, Frame::Gray(&binary))? {
        return Ok(Some(found));
    }

    debug!(
        "All {} strategies exhausted on {}x{} image",
        Strategy::ALL.len(),
        buffer.width(),
        buffer.height()
    );
    Ok(None)
}

/// One single-code attempt; empty payloads are misses.
fn single(
    detector: &dyn QrDetector,
    strategy: Strategy,
    frame: Frame<'_>,
) -> Result<Option<Decoded>, QrError> {
    match detector.detect_single(frame) {
        Ok(Some(payload)) if !payload.is_empty() => Ok(Some(hit(strategy, payload))),
        Ok(_) => {
            debug!("{strategy}: no payload");
            Ok(None)
        }
        Err(e) => Err(detector_failure(strategy, e)),
    }
}

fn hit(strategy: Strategy, payload: String) -> Decoded {
    debug!("{strategy}: decoded {} bytes", payload.len());
    Decoded { payload, strategy }
}

fn detector_failure(strategy: Strategy, e: DetectorError) -> QrError {
    QrError::invalid_image_with(format!("{e} (strategy {strategy})"), e)
}
