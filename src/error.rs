//! Error types for the qr-code-reader library.
//!
//! Two error types reflect the two layers of the system:
//!
//! * [`QrError`]: a request could not produce a payload. Three kinds exist
//!   and callers must be able to tell them apart:
//!   - `InvalidArgument`: the caller supplied zero (or both) of the two
//!     alternative inputs;
//!   - `InvalidImage`: the input never became a usable pixel buffer, or
//!     something unexpected failed while loading or decoding it;
//!   - `NotFound`: the image loaded fine but no strategy found a QR payload.
//!
//! * [`GatewayError`]: the tool gateway was asked for something it does not
//!   offer. This is a protocol-level failure and is never rendered as a tool
//!   text response.
//!
//! None of these are retryable: the decode strategy cascade is a fixed,
//! deterministic escalation and its outcome is final.

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed low-level cause kept behind an [`QrError::InvalidImage`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// All errors returned by the qr-code-reader library.
#[derive(Debug, Error)]
pub enum QrError {
    /// Zero or both of `image_path` / `image_data` were supplied.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The image could not be loaded or processed.
    ///
    /// `message` is the human-readable explanation. `source` keeps the
    /// original codec, base64, I/O or detector error for diagnostics.
    #[error("Failed to process image: {message}")]
    InvalidImage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Every detection strategy ran and none produced a payload.
    #[error("No QR code found in the image")]
    NotFound,
}

/// Copyable discriminant of [`QrError`], for callers that only branch on the
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidImage,
    NotFound,
}

impl QrError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        QrError::InvalidArgument {
            message: message.into(),
        }
    }

    /// An `InvalidImage` with no underlying cause.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        QrError::InvalidImage {
            message: message.into(),
            source: None,
        }
    }

    /// An `InvalidImage` wrapping the low-level error that triggered it.
    pub fn invalid_image_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        QrError::InvalidImage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QrError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            QrError::InvalidImage { .. } => ErrorKind::InvalidImage,
            QrError::NotFound => ErrorKind::NotFound,
        }
    }

    /// Always `false`. Detector-internal failures are folded into
    /// `InvalidImage` and treated as terminal like every other failure.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Protocol-level failures raised by [`crate::server::ToolGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The caller asked for a tool this server does not provide.
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// The tool arguments were not a JSON object of string fields.
    #[error("Invalid arguments for tool '{tool}': {detail}")]
    InvalidParams { tool: String, detail: String },
}
