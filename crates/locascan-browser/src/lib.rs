//! Browser automation capability for locascan.
//!
//! The scanner never talks to Chromium directly: it drives the
//! [`BrowserActions`] trait, which [`BrowserEngine`] implements over the
//! Chrome DevTools Protocol. Tests drive the same trait with scripted fakes.

pub mod actions;
pub mod engine;
pub mod error;
pub mod options;

pub use actions::{same_origin_path, BrowserActions, ElementInfo};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use options::LaunchOptions;
