//! CSV renderers.
//!
//! Fields are quoted only when they contain a comma, quote or line break,
//! with embedded quotes doubled.

use crate::rows::{state_rows, status_text};
use locascan_core::ScanRun;
use std::borrow::Cow;

const ISSUE_HEADERS: &[&str] = &[
    "Page",
    "Modal",
    "Text",
    "Issue Type",
    "Detected Language",
    "Expected Language",
    "Confidence",
    "Screenshot",
];

const SUMMARY_HEADERS: &[&str] = &[
    "Page",
    "Modal",
    "Issues",
    "Outcome",
    "Capture",
    "Restore",
    "Detail",
];

fn field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line: Vec<Cow<'_, str>> = fields.iter().map(|f| field(f.as_ref())).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// One row per issue, in discovery order.
#[must_use]
pub fn render_issues_csv(run: &ScanRun) -> String {
    let mut out = String::new();
    push_row(&mut out, ISSUE_HEADERS);
    for issue in &run.issues {
        push_row(
            &mut out,
            &[
                issue.page_name.clone(),
                issue.modal_name.clone().unwrap_or_default(),
                issue.text_snippet.clone(),
                issue.issue_type.to_string(),
                issue.detected_language.clone(),
                run.target_language.clone(),
                format!("{:.2}", issue.confidence),
                issue.screenshot_ref.path().display().to_string(),
            ],
        );
    }
    out
}

/// One row per attempted or skipped visual state.
///
/// States with no issues show up too, so a clean state and a state that
/// could not be scanned are never confused.
#[must_use]
pub fn render_summary_csv(run: &ScanRun) -> String {
    let mut out = String::new();
    push_row(&mut out, SUMMARY_HEADERS);
    for row in state_rows(run) {
        let mut details: Vec<&str> = Vec::new();
        if let Some(detail) = row.capture.detail.as_deref() {
            details.push(detail);
        }
        if let Some(detail) = row.restore.and_then(|r| r.detail.as_deref()) {
            details.push(detail);
        }
        push_row(
            &mut out,
            &[
                row.page_name.to_string(),
                row.section().to_string(),
                row.issues.len().to_string(),
                row.outcome().label().to_string(),
                status_text(row.capture),
                row.restore.map(status_text).unwrap_or_default(),
                details.join("; "),
            ],
        );
    }
    out
}
