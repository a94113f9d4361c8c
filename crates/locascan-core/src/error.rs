//! Core error types for locascan.
//!
//! Configuration errors are the only fatal class: they are detected before a
//! scan starts. Everything that goes wrong during a scan is scoped to a single
//! visual state and recorded in the coverage ledger instead.

use thiserror::Error;

/// Central error type for locascan operations.
#[derive(Error, Debug)]
pub enum LocascanError {
    /// An issue was recorded against a visual state the run never captured
    #[error("orphan issue: no visual state recorded for screenshot {0}")]
    OrphanIssue(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// File extension is neither TOML nor YAML
    #[error("unsupported config format for {path} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat {
        /// Offending path
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to parse YAML
    #[error("failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `LocascanError`.
pub type Result<T> = std::result::Result<T, LocascanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LocascanError::OrphanIssue("shots/dashboard.png".to_string());
        assert_eq!(
            err.to_string(),
            "orphan issue: no visual state recorded for screenshot shots/dashboard.png"
        );

        let err = ConfigError::invalid("ocr.target_language", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid config value for ocr.target_language: must not be empty"
        );
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
