//! Error types for the OCR subsystem.
//!
//! Every variant means "extraction failed for this screenshot"; the scanner
//! records it against the visual state and moves on.

use thiserror::Error;

/// Errors that can occur during text extraction.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Screenshot file does not exist
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// Backend cannot run (binary missing, no credentials)
    #[error("OCR backend unavailable ({backend}): {message}")]
    BackendUnavailable {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Backend ran but reported a failure
    #[error("extraction failed ({backend}): {message}")]
    ExtractionFailed {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// API error with status code
    #[error("API error ({backend}): status {status}, {message}")]
    ApiError {
        /// Backend name
        backend: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Quota or rate limit exceeded
    #[error("quota exceeded for {backend}: {message}")]
    QuotaExceeded {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Backend output could not be parsed
    #[error("failed to parse output from {backend}: {message}")]
    ParseError {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Extraction did not finish within the budget
    #[error("extraction timed out after {millis}ms")]
    Timeout {
        /// Budget in milliseconds
        millis: u64,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (reading the image, spawning the process)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OcrError::ApiError {
            backend: "google_vision".to_string(),
            status: 403,
            message: "API key not valid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (google_vision): status 403, API key not valid"
        );

        let err = OcrError::Timeout { millis: 60_000 };
        assert_eq!(err.to_string(), "extraction timed out after 60000ms");
    }
}
