//! # qr-code-reader
//!
//! Decode QR codes from images, as a library, a CLI, or an MCP tool server.
//!
//! ## Why a cascade?
//!
//! A single pass of a QR detector over a raw photo fails more often than it
//! should: sensor noise, uneven lighting and busy backgrounds all break the
//! finder-pattern search. Instead of a second detection algorithm, this crate
//! re-runs the same detector on a few cheap, deterministic preprocessing
//! variants and takes the first payload that comes back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image_path | image_data (base64 / data URL)
//!  │
//!  ├─ 1. Load     validate path/extension or decode base64, force RGB
//!  ├─ 2. Detect   multi-code on color, then single-code on color
//!  ├─ 3. Gray     single-code on BT.601 grayscale
//!  ├─ 4. Blur     single-code on 5×5 Gaussian-blurred grayscale
//!  ├─ 5. Otsu     single-code on Otsu-binarised grayscale
//!  └─ 6. Output   first non-empty payload, or NotFound
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qr_code_reader::{read_qr, ErrorKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     match read_qr(Some("boarding-pass.png"), None).await {
//!         Ok(payload) => println!("{payload}"),
//!         Err(e) if e.kind() == ErrorKind::NotFound => eprintln!("no QR code in image"),
//!         Err(e) => eprintln!("error: {e}"),
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `qr-code-reader` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! qr-code-reader = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod read;
pub mod safety;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReaderConfig, ReaderConfigBuilder, ACCEPTED_EXTENSIONS};
pub use error::{ErrorKind, GatewayError, QrError};
pub use pipeline::decode::{decode, Strategy};
pub use pipeline::detect::{Frame, QrDetector, RqrrDetector};
pub use pipeline::load::{load, ImageReference, PixelBuffer};
pub use read::{read_qr, read_qr_blocking, read_qr_using, read_qr_with};
pub use safety::{is_safe, is_safe_with};
pub use server::{serve_stdio, McpServer, ToolGateway};
