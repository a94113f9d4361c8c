use locascan_browser::BrowserError;
use locascan_core::ConfigError;
use locascan_lang::LangError;
use locascan_ocr::OcrError;
use thiserror::Error;

/// Errors that stop a scan, or that a single visual state reports upward.
///
/// Only [`ScanError::Config`], [`ScanError::Unreachable`] and
/// [`ScanError::Lang`] abort a run; the rest are recorded in the coverage
/// ledger against one visual state.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Startup probe could not load the application
    #[error("Application unreachable at {url}: {message}")]
    Unreachable {
        /// Probed URL
        url: String,
        /// Underlying failure
        message: String,
    },

    /// Screenshot could not be taken or stored
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Browser error
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// OCR error
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Classifier could not be built
    #[error("Classifier error: {0}")]
    Lang(#[from] LangError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;
