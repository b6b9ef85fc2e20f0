//! Configuration for QR reading.
//!
//! All tunable behaviour lives in [`ReaderConfig`], built via
//! [`ReaderConfigBuilder`]. The defaults match the advisory limits the tool
//! advertises: 50 MiB per file and 10 000 px per axis.

use crate::error::QrError;
use serde::{Deserialize, Serialize};

/// Default file size ceiling for the safety validator: 50 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Default per-axis pixel ceiling for the safety validator.
pub const DEFAULT_MAX_DIMENSION: u32 = 10_000;

/// Image file extensions the loader accepts (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

/// Configuration for a QR read.
///
/// # Example
/// ```rust
/// use qr_code_reader::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .safety_check(true)
///     .max_dimension(4096)
///     .build()
///     .unwrap();
/// assert!(config.safety_check);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Largest file, in bytes, the safety validator lets through. Default: 50 MiB.
    pub max_file_bytes: u64,

    /// Largest width or height, in pixels, the safety validator lets through.
    /// Default: 10 000.
    pub max_dimension: u32,

    /// Run the safety validator on path inputs before decoding. Default: false.
    ///
    /// The validator only reads the file header, so enabling it rejects
    /// oversized images before the full decode is paid for. Base64 inputs
    /// are never validated.
    pub safety_check: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            safety_check: false,
        }
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px;
        self
    }

    pub fn safety_check(mut self, v: bool) -> Self {
        self.config.safety_check = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, QrError> {
        let c = &self.config;
        if c.max_file_bytes == 0 {
            return Err(QrError::invalid_argument(
                "max_file_bytes must be greater than zero",
            ));
        }
        if c.max_dimension == 0 {
            return Err(QrError::invalid_argument(
                "max_dimension must be greater than zero",
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults_match_advertised_limits() {
        let c = ReaderConfig::default();
        assert_eq!(c.max_file_bytes, 52_428_800);
        assert_eq!(c.max_dimension, 10_000);
        assert!(!c.safety_check);
    }

    #[test]
    fn builder_rejects_zero_limits() {
        let err = ReaderConfig::builder().max_dimension(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ReaderConfig::builder().max_file_bytes(0).build().unwrap_err();
        assert!(err.to_string().contains("max_file_bytes"));
    }

    #[test]
    fn builder_sets_fields() {
        let c = ReaderConfig::builder()
            .max_file_bytes(1024)
            .max_dimension(64)
            .safety_check(true)
            .build()
            .unwrap();
        assert_eq!(c.max_file_bytes, 1024);
        assert_eq!(c.max_dimension, 64);
        assert!(c.safety_check);
    }
}
