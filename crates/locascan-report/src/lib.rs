//! Locascan Report - renders a finished [`ScanRun`] for humans and tools.
//!
//! Four formats are supported:
//!
//! - issue CSV: one row per issue
//! - summary CSV: one row per visual state with issue counts and coverage
//! - HTML: issues grouped per visual state next to their screenshot, and a
//!   coverage table that keeps "clean" apart from "could not scan"
//! - JSON: the whole run plus its summary
//!
//! Renderers are pure functions from a run to a string; [`write_reports`]
//! puts them on disk.
//!
//! [`ScanRun`]: locascan_core::ScanRun

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod csv;
#[allow(missing_docs)]
pub mod error;
pub mod html;
pub mod json;
mod rows;
pub mod writer;

pub use csv::{render_issues_csv, render_summary_csv};
pub use error::{ReportError, Result};
pub use html::render_html;
pub use json::render_json;
pub use writer::{report_file_name, write_reports};
