//! Locascan Core - Foundation crate for the locascan localization scanner.
//!
//! This crate provides the shared data model, configuration loading and
//! error types that every other locascan crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML/YAML scan configuration with environment overrides
//! - [`language`] - ISO 639 language code resolution
//! - [`types`] - Pages, modals, visual states, text blocks, issues and the scan run
//!
//! # Example
//!
//! ```rust
//! use locascan_core::ScanConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScanConfig::from_toml_str(r#"
//! [application]
//! base_url = "https://app.example.com"
//!
//! [[pages]]
//! name = "Dashboard"
//! url_path = "/dashboard"
//! "#)?;
//! config.validate()?;
//! assert_eq!(config.page_url(&config.pages[0]), "https://app.example.com/dashboard");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod language;
pub mod types;

// Re-export commonly used types
pub use config::{
    ApplicationConfig, BrowserConfig, DictionaryPrecedence, GoogleVisionConfig,
    LanguageDetectionConfig, OcrConfig, OcrEngineKind, OutputConfig, ReportFormat, ScanConfig,
    TesseractConfig,
};
pub use error::{ConfigError, ConfigResult, LocascanError, Result};
pub use types::{
    BoundingRegion, ClassificationRule, ClassifiedBlock, CoverageEntry, CoveragePhase,
    CoverageStatus, FailureReason, Issue, IssueType, ModalSpec, PageSpec, RunSummary, ScanRun,
    ScreenshotRef, TextBlock, Verdict, VisualState,
};
