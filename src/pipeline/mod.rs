//! Pipeline stages for QR reading.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the detector can be swapped without touching loading or
//! preprocessing.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ decode ──(per strategy)──▶ preprocess ──▶ detect
//! (path/base64) (cascade)              (gray/blur/otsu)  (rqrr)
//! ```
//!
//! 1. [`load`]      : validate the reference and decode it to an RGB buffer
//! 2. [`decode`]    : run the five-step strategy cascade
//! 3. [`preprocess`]: grayscale, Gaussian blur and Otsu variants
//! 4. [`detect`]    : the [`detect::QrDetector`] seam and its `rqrr` backend

pub mod decode;
pub mod detect;
pub mod load;
pub mod preprocess;
