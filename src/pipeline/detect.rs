//! QR detection primitive.
//!
//! The cascade in [`crate::pipeline::decode`] only talks to the
//! [`QrDetector`] trait. [`RqrrDetector`] is the production implementation;
//! tests substitute their own detectors to drive specific cascade paths.

use crate::pipeline::preprocess::luma;
use image::{GrayImage, RgbImage};
use rqrr::PreparedImage;
use thiserror::Error;
use tracing::trace;

/// A borrowed view of the pixels handed to a detector.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Color(&'a RgbImage),
    Gray(&'a GrayImage),
}

impl Frame<'_> {
    pub fn width(&self) -> u32 {
        match self {
            Frame::Color(img) => img.width(),
            Frame::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Color(img) => img.height(),
            Frame::Gray(img) => img.height(),
        }
    }

    /// Intensity of the pixel at `(x, y)`; color frames are reduced to luma.
    #[inline]
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        match self {
            Frame::Color(img) => {
                let [r, g, b] = img.get_pixel(x, y).0;
                luma(r, g, b)
            }
            Frame::Gray(img) => img.get_pixel(x, y).0[0],
        }
    }
}

/// A detector failed internally, as opposed to finding nothing.
#[derive(Debug, Error)]
#[error("QR detector failed: {0}")]
pub struct DetectorError(pub String);

/// A QR detection + decoding primitive.
///
/// Implementations must be stateless between calls: the cascade may call
/// them several times per image and from many threads at once.
pub trait QrDetector: Send + Sync {
    /// Decode every QR code found in `frame`, in detection order.
    ///
    /// Entries may be empty strings when a region was located but its
    /// content could not be read.
    fn detect_multi(&self, frame: Frame<'_>) -> Result<Vec<String>, DetectorError>;

    /// Decode a single QR code from `frame`.
    ///
    /// `Ok(None)` means nothing was found.
    fn detect_single(&self, frame: Frame<'_>) -> Result<Option<String>, DetectorError>;
}

/// [`QrDetector`] backed by the `rqrr` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDetector;

impl RqrrDetector {
    pub fn new() -> Self {
        Self
    }

    /// Locate up to `limit` grids and decode each; `None` marks a grid that
    /// was found but could not be read.
    fn decode_grids(frame: Frame<'_>, limit: usize) -> Vec<Option<String>> {
        let mut prepared = PreparedImage::prepare_from_greyscale(
            frame.width() as usize,
            frame.height() as usize,
            |x, y| frame.intensity(x as u32, y as u32),
        );
        let grids = prepared.detect_grids();
        trace!("rqrr located {} candidate grids", grids.len());

        grids
            .iter()
            .take(limit)
            .map(|g| match g.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    trace!("grid decode failed: {e:?}");
                    None
                }
            })
            .collect()
    }
}

impl QrDetector for RqrrDetector {
    fn detect_multi(&self, frame: Frame<'_>) -> Result<Vec<String>, DetectorError> {
        Ok(Self::decode_grids(frame, usize::MAX)
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    fn detect_single(&self, frame: Frame<'_>) -> Result<Option<String>, DetectorError> {
        Ok(Self::decode_grids(frame, 1).into_iter().next().flatten())
    }
}
