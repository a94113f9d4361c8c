//! Per-state view of a run shared by the summary renderers.

use locascan_core::{CoverageEntry, CoveragePhase, CoverageStatus, Issue, ScanRun, VisualState};

/// How a visual state came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Captured, nothing flagged
    Clean,
    /// Captured, at least one issue
    Issues,
    /// Attempted, could not be scanned fully
    Failed,
    /// Never attempted
    Skipped,
}

impl Outcome {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Issues => "issues",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One visual state with its ledger entries and issues.
pub(crate) struct StateRow<'a> {
    pub page_name: &'a str,
    pub modal_name: Option<&'a str>,
    pub capture: &'a CoverageEntry,
    pub restore: Option<&'a CoverageEntry>,
    pub issues: Vec<&'a Issue>,
    pub state: Option<&'a VisualState>,
}

impl StateRow<'_> {
    pub(crate) fn outcome(&self) -> Outcome {
        match self.capture.status {
            CoverageStatus::Skipped => Outcome::Skipped,
            CoverageStatus::Failed => Outcome::Failed,
            CoverageStatus::Success if self.issues.is_empty() => Outcome::Clean,
            CoverageStatus::Success => Outcome::Issues,
        }
    }

    pub(crate) fn section(&self) -> &str {
        self.modal_name.unwrap_or("main")
    }
}

/// Ledger capture entries in order, joined with everything else about the state.
pub(crate) fn state_rows(run: &ScanRun) -> Vec<StateRow<'_>> {
    run.ledger
        .iter()
        .filter(|e| e.phase == CoveragePhase::Capture)
        .map(|capture| {
            let page_name = capture.page_name.as_str();
            let modal_name = capture.modal_name.as_deref();
            StateRow {
                page_name,
                modal_name,
                capture,
                restore: run.ledger.iter().find(|e| {
                    e.phase == CoveragePhase::Restore
                        && e.page_name == page_name
                        && e.modal_name.as_deref() == modal_name
                }),
                issues: run.issues_for(page_name, modal_name).collect(),
                state: run
                    .states
                    .iter()
                    .find(|s| s.page_name == page_name && s.modal_name.as_deref() == modal_name),
            }
        })
        .collect()
}

/// "Success", "Failed (LoadTimeout)", "Skipped (Cancelled)".
pub(crate) fn status_text(entry: &CoverageEntry) -> String {
    let status = match entry.status {
        CoverageStatus::Success => "Success",
        CoverageStatus::Failed => "Failed",
        CoverageStatus::Skipped => "Skipped",
    };
    match entry.reason {
        Some(reason) => format!("{status} ({reason})"),
        None => status.to_string(),
    }
}
