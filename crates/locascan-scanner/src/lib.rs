//! Locascan Scanner - drives a browser through an application's pages and
//! dialogs and collects untranslated text.
//!
//! The scanner coordinates the pieces of a scan:
//!
//! - [`PageLoadVerifier`] waits until a page or dialog looks settled
//! - [`ModalDiscoveryEngine`] finds dialog triggers, opens, captures and closes them
//! - [`ScreenshotStore`] persists captured states
//! - [`ScanOrchestrator`] runs pages in order, feeds screenshots through OCR
//!   and classification, and keeps the coverage ledger
//!
//! # Example
//!
//! ```rust,ignore
//! use locascan_browser::BrowserEngine;
//! use locascan_core::ScanConfig;
//! use locascan_scanner::{ScanOrchestrator, ScreenshotStore};
//! use std::sync::Arc;
//!
//! let config = ScanConfig::load_with_env("locascan.toml")?;
//! let browser = Arc::new(BrowserEngine::new().await?);
//! let orchestrator = ScanOrchestrator::from_config(
//!     browser,
//!     &config,
//!     ScreenshotStore::new("./screenshots/session"),
//! )?;
//!
//! let run = orchestrator.run(&config).await?;
//! println!("{} issue(s)", run.issues.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod modal;
pub mod orchestrator;
pub mod screenshots;
pub mod verifier;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use modal::{
    CandidateOrigin, CloseOutcome, ModalCandidate, ModalDiscoveryEngine, OpenOutcome,
    CLOSE_SELECTORS, CONTAINER_SELECTORS, TRIGGER_SELECTORS,
};
pub use orchestrator::ScanOrchestrator;
pub use screenshots::{sanitize_file_name, ScreenshotStore};
pub use verifier::{LoadBudget, LoadOutcome, LoadStage, PageLoadVerifier, VerifyScope};
