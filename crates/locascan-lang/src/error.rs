//! Error types for language classification.

use thiserror::Error;

/// Errors raised while building a classifier.
///
/// Classification itself never fails; only construction can.
#[derive(Error, Debug)]
pub enum LangError {
    /// Language code the detector does not know
    #[error("unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// Allow-list term that cannot be compiled into a matcher
    #[error("invalid allowed term '{term}': {message}")]
    InvalidTerm {
        /// Offending term
        term: String,
        /// Error message
        message: String,
    },
}

/// Result type alias for classification setup.
pub type Result<T> = std::result::Result<T, LangError>;
