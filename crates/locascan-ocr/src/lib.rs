//! Locascan OCR - text extraction from screenshots.
//!
//! This crate provides a uniform interface over OCR backends. Every backend
//! maps an image to [`TextBlock`]s with a pixel region and a confidence in
//! `[0, 1]`; the [`OcrAdapter`] bounds each call with a timeout and runs the
//! result through the [`Normalizer`].
//!
//! # Backends
//!
//! - [`TesseractBackend`]: local `tesseract` binary, line-level output
//! - [`GoogleVisionBackend`]: Google Cloud Vision `TEXT_DETECTION`, word-level output
//!
//! # Example
//!
//! ```rust,ignore
//! use locascan_core::{OcrConfig, ScreenshotRef};
//! use locascan_ocr::OcrAdapter;
//!
//! let adapter = OcrAdapter::from_config(&OcrConfig::default())?;
//! let blocks = adapter.extract(&ScreenshotRef::new("dashboard.png")).await?;
//! for block in blocks {
//!     println!("{} ({:.2})", block.raw_text, block.ocr_confidence);
//! }
//! ```
//!
//! [`TextBlock`]: locascan_core::TextBlock

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapter;
pub mod backend;
pub mod backends;
pub mod error;
pub mod normalize;

// Re-export commonly used types
pub use adapter::OcrAdapter;
pub use backend::{BackendCapabilities, OcrBackend};
pub use backends::{GoogleVisionBackend, TesseractBackend};
pub use error::{OcrError, Result};
pub use normalize::Normalizer;
