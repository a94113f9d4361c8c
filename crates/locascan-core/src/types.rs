//! Shared types used across locascan.
//!
//! Pages and modals come from configuration, visual states and text blocks are
//! produced while scanning, and everything a run learns ends up in a
//! [`ScanRun`]: the captured states, the issues and the coverage ledger.

use crate::error::{LocascanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

fn default_interaction_depth() -> u32 {
    1
}

/// A modal reachable from a page by clicking a trigger element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSpec {
    /// Human-readable modal name, used in reports
    pub name: String,
    /// CSS selector of the element that opens the modal
    #[serde(alias = "selector")]
    pub trigger_selector: String,
    /// Number of stacked dialog layers the trigger opens
    #[serde(default = "default_interaction_depth")]
    pub interaction_depth: u32,
}

impl ModalSpec {
    /// Create a single-layer modal spec.
    #[must_use]
    pub fn new(name: impl Into<String>, trigger_selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trigger_selector: trigger_selector.into(),
            interaction_depth: 1,
        }
    }
}

/// A page to scan. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page name, unique within a configuration
    pub name: String,
    /// Path relative to the application base URL, or an absolute URL
    #[serde(alias = "url")]
    pub url_path: String,
    /// Modals configured for this page
    #[serde(default, alias = "modals")]
    pub explicit_modals: Vec<ModalSpec>,
    /// Load timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Stabilization pause override in milliseconds
    #[serde(default)]
    pub stabilization_ms: Option<u64>,
}

impl PageSpec {
    /// Create a page spec with no modals and default timings.
    #[must_use]
    pub fn new(name: impl Into<String>, url_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_path: url_path.into(),
            explicit_modals: Vec::new(),
            timeout_ms: None,
            stabilization_ms: None,
        }
    }

    /// Attach an explicit modal.
    #[must_use]
    pub fn with_modal(mut self, modal: ModalSpec) -> Self {
        self.explicit_modals.push(modal);
        self
    }
}

/// Location of a stored screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenshotRef(PathBuf);

impl ScreenshotRef {
    /// Wrap a screenshot path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Path of the screenshot on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ScreenshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// One captured rendering of the UI: a page at rest or a page with a modal open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualState {
    /// Page the state belongs to
    pub page_name: String,
    /// Modal open in this state, if any
    pub modal_name: Option<String>,
    /// Screenshot taken of this state
    pub screenshot_ref: ScreenshotRef,
    /// Capture time, milliseconds since the Unix epoch
    pub captured_at_ms: i64,
}

impl VisualState {
    /// Create a visual state stamped with the current time.
    #[must_use]
    pub fn new(
        page_name: impl Into<String>,
        modal_name: Option<String>,
        screenshot_ref: ScreenshotRef,
    ) -> Self {
        Self {
            page_name: page_name.into(),
            modal_name,
            screenshot_ref,
            captured_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// "Page" or "Page / Modal", for logs and reports.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.modal_name {
            Some(modal) => format!("{} / {}", self.page_name, modal),
            None => self.page_name.clone(),
        }
    }
}

/// Axis-aligned pixel box around a text block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingRegion {
    /// Create a region from its top-left corner and size.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest region containing all points. Empty input yields the zero region.
    #[must_use]
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let Some(&(first_x, first_y)) = points.first() else {
            return Self::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);
        for &(x, y) in &points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Vertical center.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Smallest region containing both regions.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Raw OCR output for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Text as recognized
    pub raw_text: String,
    /// Where the text sits in the screenshot
    pub bounding_region: BoundingRegion,
    /// Recognition confidence in [0, 1]
    pub ocr_confidence: f32,
}

impl TextBlock {
    /// Create a text block.
    #[must_use]
    pub fn new(raw_text: impl Into<String>, bounding_region: BoundingRegion, ocr_confidence: f32) -> Self {
        Self {
            raw_text: raw_text.into(),
            bounding_region,
            ocr_confidence,
        }
    }
}

/// Outcome of classifying a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Text is in the target language or could not be judged
    Clean,
    /// Text is in a checked language: a missing translation
    Flagged,
    /// Text is exempt through the allow-list
    Suppressed,
}

/// Which classification rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Matched the allow-list
    AllowList,
    /// Shorter than the minimum classifiable length
    TooShort,
    /// Found in the target-language dictionary
    TargetDictionary,
    /// Found in a checked-language dictionary
    CheckedDictionary,
    /// Decided by the statistical detector
    Detector,
}

/// A text block with its language verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedBlock {
    /// Cleaned text
    pub text: String,
    /// ISO 639-1 code of the detected language, if any
    pub detected_language: Option<String>,
    /// Confidence of the verdict in [0, 1]
    pub classification_confidence: f32,
    /// The verdict
    pub verdict: Verdict,
    /// Rule that produced the verdict
    pub rule: ClassificationRule,
}

impl ClassifiedBlock {
    /// Whether this block should become an issue.
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.verdict == Verdict::Flagged
    }
}

/// Kind of localization issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    /// Text rendered in a checked language instead of the target language
    MissingTranslation,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTranslation => write!(f, "Missing Translation"),
        }
    }
}

/// A localization issue found in a captured visual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Page the issue was found on
    pub page_name: String,
    /// Modal the issue was found in, if any
    pub modal_name: Option<String>,
    /// The offending text
    pub text_snippet: String,
    /// Kind of issue
    pub issue_type: IssueType,
    /// Screenshot of the visual state
    pub screenshot_ref: ScreenshotRef,
    /// Language the text was classified as
    pub detected_language: String,
    /// Classification confidence
    pub confidence: f32,
}

impl Issue {
    /// Build an issue from a flagged block. Returns `None` for any other verdict.
    #[must_use]
    pub fn from_classified(state: &VisualState, block: &ClassifiedBlock) -> Option<Self> {
        if !block.is_flagged() {
            return None;
        }
        Some(Self {
            page_name: state.page_name.clone(),
            modal_name: state.modal_name.clone(),
            text_snippet: block.text.clone(),
            issue_type: IssueType::MissingTranslation,
            screenshot_ref: state.screenshot_ref.clone(),
            detected_language: block
                .detected_language
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            confidence: block.classification_confidence,
        })
    }
}

/// Outcome of an attempted visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageStatus {
    /// Captured (or restored) cleanly
    Success,
    /// Attempted but something went wrong; see the reason
    Failed,
    /// Not attempted
    Skipped,
}

/// What a ledger entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoveragePhase {
    /// Capturing a page or modal
    Capture,
    /// Returning the page to rest after a modal
    Restore,
}

/// Why a state failed or was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Page or modal never reached a stable state
    LoadTimeout,
    /// OCR backend failed
    OcrError,
    /// Modal could not be confirmed closed
    ModalStuckOpen,
    /// URL unreachable
    NavigationError,
    /// Clicking the trigger did not open anything
    ModalNotOpened,
    /// Screenshot could not be taken or stored
    CaptureError,
    /// Run was cancelled before this state
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadTimeout => "LoadTimeout",
            Self::OcrError => "OcrError",
            Self::ModalStuckOpen => "ModalStuckOpen",
            Self::NavigationError => "NavigationError",
            Self::ModalNotOpened => "ModalNotOpened",
            Self::CaptureError => "CaptureError",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// One line of the coverage ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    /// Page name
    pub page_name: String,
    /// Modal name, if the entry is about a modal
    pub modal_name: Option<String>,
    /// Capture or restore
    pub phase: CoveragePhase,
    /// Outcome
    pub status: CoverageStatus,
    /// Failure or skip reason
    pub reason: Option<FailureReason>,
    /// Free-form detail, usually the underlying error message
    pub detail: Option<String>,
}

impl CoverageEntry {
    /// A successful entry.
    #[must_use]
    pub fn success(page_name: &str, modal_name: Option<&str>, phase: CoveragePhase) -> Self {
        Self {
            page_name: page_name.to_string(),
            modal_name: modal_name.map(str::to_string),
            phase,
            status: CoverageStatus::Success,
            reason: None,
            detail: None,
        }
    }

    /// A failed entry.
    #[must_use]
    pub fn failed(
        page_name: &str,
        modal_name: Option<&str>,
        phase: CoveragePhase,
        reason: FailureReason,
        detail: Option<String>,
    ) -> Self {
        Self {
            page_name: page_name.to_string(),
            modal_name: modal_name.map(str::to_string),
            phase,
            status: CoverageStatus::Failed,
            reason: Some(reason),
            detail,
        }
    }

    /// A skipped entry.
    #[must_use]
    pub fn skipped(
        page_name: &str,
        modal_name: Option<&str>,
        phase: CoveragePhase,
        reason: FailureReason,
    ) -> Self {
        Self {
            page_name: page_name.to_string(),
            modal_name: modal_name.map(str::to_string),
            phase,
            status: CoverageStatus::Skipped,
            reason: Some(reason),
            detail: None,
        }
    }

    fn covers(&self, page_name: &str, modal_name: Option<&str>) -> bool {
        self.page_name == page_name && self.modal_name.as_deref() == modal_name
    }
}

/// Totals over a run, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Distinct pages with at least one ledger entry
    pub pages_attempted: usize,
    /// Visual states captured
    pub states_captured: usize,
    /// Issues found
    pub issues: usize,
    /// Capture entries that failed
    pub failed_states: usize,
    /// Capture entries that were skipped
    pub skipped_states: usize,
}

/// Everything a scan run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    /// Unique run identifier
    pub run_id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished, if it has
    pub finished_at: Option<DateTime<Utc>>,
    /// Language the UI should be in
    pub target_language: String,
    /// Languages that indicate a missing translation
    pub check_languages: Vec<String>,
    /// Captured visual states, in capture order
    pub states: Vec<VisualState>,
    /// Issues found
    pub issues: Vec<Issue>,
    /// Coverage ledger, in attempt order
    pub ledger: Vec<CoverageEntry>,
    /// Whether the run stopped early on request
    pub cancelled: bool,
}

impl ScanRun {
    /// Start a new, empty run.
    #[must_use]
    pub fn new(target_language: impl Into<String>, check_languages: Vec<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            target_language: target_language.into(),
            check_languages,
            states: Vec::new(),
            issues: Vec::new(),
            ledger: Vec::new(),
            cancelled: false,
        }
    }

    /// Record a captured visual state.
    pub fn record_state(&mut self, state: VisualState) {
        self.states.push(state);
    }

    /// Append a coverage ledger entry.
    pub fn record_coverage(&mut self, entry: CoverageEntry) {
        self.ledger.push(entry);
    }

    /// Add an issue. The issue must reference a recorded visual state.
    pub fn add_issue(&mut self, issue: Issue) -> Result<()> {
        let known = self.states.iter().any(|s| {
            s.screenshot_ref == issue.screenshot_ref
                && s.page_name == issue.page_name
                && s.modal_name == issue.modal_name
        });
        if !known {
            return Err(LocascanError::OrphanIssue(issue.screenshot_ref.to_string()));
        }
        self.issues.push(issue);
        Ok(())
    }

    /// Mark the run finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Issues found in one visual state.
    pub fn issues_for<'a>(
        &'a self,
        page_name: &'a str,
        modal_name: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues
            .iter()
            .filter(move |i| i.page_name == page_name && i.modal_name.as_deref() == modal_name)
    }

    /// Capture-phase ledger entry for a page or modal.
    #[must_use]
    pub fn capture_entry(&self, page_name: &str, modal_name: Option<&str>) -> Option<&CoverageEntry> {
        self.ledger
            .iter()
            .find(|e| e.phase == CoveragePhase::Capture && e.covers(page_name, modal_name))
    }

    /// Ledger entries that did not succeed.
    pub fn unsuccessful(&self) -> impl Iterator<Item = &CoverageEntry> {
        self.ledger
            .iter()
            .filter(|e| e.status != CoverageStatus::Success)
    }

    /// Issues whose visual state has no capture entry in the ledger.
    #[must_use]
    pub fn orphan_issues(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| {
                self.capture_entry(&i.page_name, i.modal_name.as_deref())
                    .is_none()
            })
            .collect()
    }

    /// Totals over the run.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut pages: Vec<&str> = self.ledger.iter().map(|e| e.page_name.as_str()).collect();
        pages.sort_unstable();
        pages.dedup();

        let captures = self
            .ledger
            .iter()
            .filter(|e| e.phase == CoveragePhase::Capture);

        RunSummary {
            pages_attempted: pages.len(),
            states_captured: self.states.len(),
            issues: self.issues.len(),
            failed_states: captures
                .clone()
                .filter(|e| e.status == CoverageStatus::Failed)
                .count(),
            skipped_states: captures
                .filter(|e| e.status == CoverageStatus::Skipped)
                .count(),
        }
    }
}
