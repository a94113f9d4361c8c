//! Modal discovery, opening and closing.

use crate::screenshots::ScreenshotStore;
use crate::verifier::{LoadBudget, LoadOutcome, PageLoadVerifier, VerifyScope};
use locascan_browser::{BrowserActions, ElementInfo};
use locascan_core::{ApplicationConfig, ModalSpec, VisualState};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Elements that commonly open dialogs.
pub const TRIGGER_SELECTORS: &[&str] = &[
    "button",
    "a[role=\"button\"]",
    "[data-testid*=\"modal\"]",
    "[aria-haspopup=\"dialog\"]",
    ".modal-trigger",
    "[class*=\"modal\"]",
    "[class*=\"button\"]",
    "[class*=\"btn\"]",
    "[aria-label*=\"settings\"]",
    "[aria-label*=\"options\"]",
    "[aria-label*=\"menu\"]",
    "a[href=\"#\"][class*=\"icon\"]",
    "[data-bs-toggle=\"modal\"]",
];

/// Elements that are open dialogs.
pub const CONTAINER_SELECTORS: &[&str] = &[
    ".modal.show",
    "[role=\"dialog\"]",
    "[role=\"alertdialog\"]",
    "[aria-modal=\"true\"]",
    "dialog[open]",
    ".dialog",
    ".popup",
];

/// Buttons that commonly dismiss dialogs, tried in order.
pub const CLOSE_SELECTORS: &[&str] = &[
    ".modal-close",
    "[aria-label=\"Close\"]",
    "[aria-label=\"close\"]",
    "[data-dismiss=\"modal\"]",
    "[data-bs-dismiss=\"modal\"]",
    "button.close",
    ".btn-close",
    "[class*=\"close\"]",
    "[class*=\"cancel\"]",
];

/// Names longer than this are not used for generated modal names.
const MAX_NAME_TEXT: usize = 30;

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// Listed in the page configuration
    Explicit,
    /// Found by the trigger heuristics
    Discovered,
}

/// A modal the engine will try to open, capture and close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalCandidate {
    /// Modal name used in reports
    pub name: String,
    /// Selector that opens it
    pub trigger_selector: String,
    /// Stacked dialog layers the trigger opens
    pub interaction_depth: u32,
    /// Where it came from
    pub origin: CandidateOrigin,
}

impl ModalCandidate {
    /// Candidate for a configured modal.
    #[must_use]
    pub fn explicit(spec: &ModalSpec) -> Self {
        Self {
            name: spec.name.clone(),
            trigger_selector: spec.trigger_selector.clone(),
            interaction_depth: spec.interaction_depth.max(1),
            origin: CandidateOrigin::Explicit,
        }
    }

    /// Candidate for a discovered trigger element.
    #[must_use]
    pub fn discovered(name: String, element: &ElementInfo) -> Self {
        Self {
            name,
            trigger_selector: element.path.clone(),
            interaction_depth: 1,
            origin: CandidateOrigin::Discovered,
        }
    }
}

/// Result of trying to open a modal.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// A dialog appeared (or the URL changed) and was captured
    Opened {
        /// Captured state
        state: VisualState,
        /// Verification of the dialog before capture
        load: LoadOutcome,
        /// Visible dialog containers before the click
        baseline: usize,
    },
    /// A dialog appeared but the screenshot could not be stored
    CaptureFailed {
        /// Failure description
        reason: String,
        /// Visible dialog containers before the click
        baseline: usize,
    },
    /// Nothing happened after the click
    NotOpened {
        /// Failure description
        reason: String,
        /// Visible dialog containers before the click
        baseline: usize,
    },
}

/// Result of trying to close a modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Back on the page with no extra dialog visible
    Closed {
        /// Verification of the page after closing
        load: LoadOutcome,
    },
    /// At least one layer refused to close
    StuckOpen {
        /// Close attempts made
        attempts: u32,
    },
}

/// Finds modal triggers and drives them through open, capture and close.
pub struct ModalDiscoveryEngine {
    verifier: PageLoadVerifier,
    modal_timeout: Duration,
    stabilization: Duration,
    auto_discover: bool,
    max_discovered: usize,
    max_close_attempts: u32,
    dedupe_triggers: bool,
}

impl ModalDiscoveryEngine {
    /// Create an engine from the application settings.
    #[must_use]
    pub fn from_config(config: &ApplicationConfig) -> Self {
        Self {
            verifier: PageLoadVerifier::from_config(config),
            modal_timeout: Duration::from_millis(config.modal_timeout_ms),
            stabilization: Duration::from_millis(config.stabilization_ms),
            auto_discover: config.auto_discover_modals,
            max_discovered: config.max_discovered_modals,
            max_close_attempts: config.max_close_attempts.max(1),
            dedupe_triggers: config.dedupe_repeated_triggers,
        }
    }

    /// Combined selector for open dialog containers.
    #[must_use]
    pub fn container_selector() -> String {
        CONTAINER_SELECTORS.join(", ")
    }

    async fn visible_containers(browser: &dyn BrowserActions) -> usize {
        browser
            .visible_count(&Self::container_selector())
            .await
            .unwrap_or_else(|e| {
                tracing::debug!("Container query failed: {}", e);
                0
            })
    }

    /// Build the candidate list for the current page.
    ///
    /// Explicit specs come first, in configured order. Discovered triggers
    /// follow, minus any element an explicit selector already targets, minus
    /// repeats of the same trigger, up to the discovery cap.
    pub async fn discover(
        &self,
        browser: &dyn BrowserActions,
        explicit: &[ModalSpec],
    ) -> Vec<ModalCandidate> {
        let mut candidates: Vec<ModalCandidate> =
            explicit.iter().map(ModalCandidate::explicit).collect();
        if !self.auto_discover || self.max_discovered == 0 {
            return candidates;
        }

        let mut explicit_paths = HashSet::new();
        for spec in explicit {
            match browser.query_elements(&spec.trigger_selector).await {
                Ok(elements) => explicit_paths.extend(elements.into_iter().map(|e| e.path)),
                Err(e) => tracing::debug!("Explicit trigger {} not queryable: {}", spec.name, e),
            }
        }

        let elements = match browser.query_elements(&TRIGGER_SELECTORS.join(", ")).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!("Modal trigger discovery failed: {}", e);
                return candidates;
            }
        };

        let mut names: HashSet<String> = candidates.iter().map(|c| c.name.clone()).collect();
        let mut signatures = HashSet::new();
        let mut discovered = 0;

        for element in elements {
            if discovered >= self.max_discovered {
                break;
            }
            if !element.visible || explicit_paths.contains(&element.path) {
                continue;
            }
            if self.dedupe_triggers && !signatures.insert(signature(&element)) {
                continue;
            }

            let name = unique_name(generate_name(&element, discovered + 1), &mut names);
            candidates.push(ModalCandidate::discovered(name, &element));
            discovered += 1;
        }

        tracing::info!(
            "{} modal candidate(s): {} explicit, {} discovered",
            candidates.len(),
            explicit.len(),
            discovered
        );
        candidates
    }

    /// Click a candidate's trigger, wait for a dialog, verify and capture it.
    pub async fn open(
        &self,
        browser: &dyn BrowserActions,
        candidate: &ModalCandidate,
        page_name: &str,
        store: &ScreenshotStore,
    ) -> OpenOutcome {
        let baseline = Self::visible_containers(browser).await;
        let baseline_url = browser.current_url().await.unwrap_or_default();

        tracing::info!("Attempting to open modal: {}", candidate.name);
        if let Err(e) = browser.click(&candidate.trigger_selector).await {
            return OpenOutcome::NotOpened {
                reason: format!("trigger click failed: {e}"),
                baseline,
            };
        }

        let Some(url_changed) = self.wait_for_dialog(browser, baseline, &baseline_url).await else {
            return OpenOutcome::NotOpened {
                reason: format!(
                    "no dialog appeared within {}ms",
                    self.modal_timeout.as_millis()
                ),
                baseline,
            };
        };

        let scope = if url_changed {
            VerifyScope::Page
        } else {
            VerifyScope::Container(Self::container_selector())
        };
        let load = self
            .verifier
            .verify(browser, &scope, self.modal_timeout, self.stabilization)
            .await;

        let png = match browser.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                return OpenOutcome::CaptureFailed {
                    reason: e.to_string(),
                    baseline,
                }
            }
        };
        let shot_name = format!("{page_name}_{}", candidate.name);
        match store.save(&shot_name, true, &png).await {
            Ok(screenshot) => OpenOutcome::Opened {
                state: VisualState::new(page_name, Some(candidate.name.clone()), screenshot),
                load,
                baseline,
            },
            Err(e) => OpenOutcome::CaptureFailed {
                reason: e.to_string(),
                baseline,
            },
        }
    }

    /// Poll until a new dialog container is visible or the URL changes.
    /// Returns `Some(url_changed)` on success.
    async fn wait_for_dialog(
        &self,
        browser: &dyn BrowserActions,
        baseline: usize,
        baseline_url: &str,
    ) -> Option<bool> {
        let deadline = Instant::now() + self.modal_timeout;
        loop {
            if let Ok(url) = browser.current_url().await {
                if !baseline_url.is_empty() && !same_page(&url, baseline_url) {
                    tracing::info!("Trigger navigated to {}", url);
                    return Some(true);
                }
            }
            if Self::visible_containers(browser).await > baseline {
                return Some(false);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(self.verifier.poll_interval().min(deadline - now)).await;
        }
    }

    /// Dismiss every layer the candidate opened and return to `page_url`.
    ///
    /// Each layer gets up to `max_close_attempts` attempts; an attempt presses
    /// Escape, then clicks the first visible known close button. If the
    /// trigger navigated away, the page URL is loaded again instead. The
    /// restored page is verified within `page_budget`.
    pub async fn close(
        &self,
        browser: &dyn BrowserActions,
        candidate: &ModalCandidate,
        page_url: &str,
        baseline: usize,
        page_budget: LoadBudget,
    ) -> CloseOutcome {
        let mut attempts = 0;

        if self.navigated_away(browser, page_url).await {
            attempts += 1;
            if let Err(e) = browser.navigate(page_url).await {
                tracing::warn!("Could not return to {} after {}: {}", page_url, candidate.name, e);
                return CloseOutcome::StuckOpen { attempts };
            }
        }

        for layer in 1..=candidate.interaction_depth {
            let before = Self::visible_containers(browser).await;
            if before <= baseline {
                break;
            }

            let mut closed = false;
            for _ in 0..self.max_close_attempts {
                attempts += 1;
                if self.try_close_layer(browser, before, baseline).await {
                    closed = true;
                    break;
                }
            }

            if !closed {
                tracing::warn!(
                    "Modal {} layer {} stuck open after {} attempt(s)",
                    candidate.name,
                    layer,
                    attempts
                );
                return CloseOutcome::StuckOpen { attempts };
            }
        }

        if Self::visible_containers(browser).await > baseline
            || self.navigated_away(browser, page_url).await
        {
            return CloseOutcome::StuckOpen { attempts };
        }

        let load = self
            .verifier
            .verify_within(browser, &VerifyScope::Page, page_budget)
            .await;
        tracing::info!("Closed modal {}", candidate.name);
        CloseOutcome::Closed { load }
    }

    async fn navigated_away(&self, browser: &dyn BrowserActions, page_url: &str) -> bool {
        match browser.current_url().await {
            Ok(url) => !same_page(&url, page_url),
            Err(_) => false,
        }
    }

    /// One close attempt on the topmost layer.
    async fn try_close_layer(
        &self,
        browser: &dyn BrowserActions,
        before: usize,
        baseline: usize,
    ) -> bool {
        let layer_gone = |now: usize| now < before || now <= baseline;

        if let Err(e) = browser.press_key("Escape").await {
            tracing::debug!("Escape failed: {}", e);
        }
        tokio::time::sleep(self.verifier.poll_interval()).await;
        if layer_gone(Self::visible_containers(browser).await) {
            return true;
        }

        for selector in CLOSE_SELECTORS {
            if !matches!(browser.visible_count(selector).await, Ok(n) if n > 0) {
                continue;
            }
            if let Err(e) = browser.click(selector).await {
                tracing::debug!("Close button {} failed: {}", selector, e);
                continue;
            }
            tokio::time::sleep(self.verifier.poll_interval()).await;
            if layer_gone(Self::visible_containers(browser).await) {
                return true;
            }
        }
        false
    }
}

/// Whether two URLs address the same page, ignoring a trailing slash and fragment.
fn same_page(a: &str, b: &str) -> bool {
    let strip = |u: &str| {
        let u = u.split('#').next().unwrap_or(u);
        u.trim_end_matches('/').to_string()
    };
    strip(a) == strip(b)
}

/// Tag, text, aria-label, title, classes, test id.
type Signature = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Identity of a trigger element for collapsing per-row repeats.
fn signature(element: &ElementInfo) -> Signature {
    (
        element.tag.clone(),
        element
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
        element.aria_label.clone(),
        element.title.clone(),
        element.classes.clone(),
        element.test_id.clone(),
    )
}

/// Name a discovered modal after its trigger.
fn generate_name(element: &ElementInfo, index: usize) -> String {
    let text = element.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let label = if !text.is_empty() && text.chars().count() < MAX_NAME_TEXT {
        Some(text)
    } else {
        non_empty(&element.aria_label)
            .or_else(|| non_empty(&element.title))
            .or_else(|| non_empty(&element.id))
    };

    match label {
        Some(label) => sanitize_name(&format!("Modal_{label}")),
        None => format!("Modal_{index}"),
    }
}

/// Keep `[A-Za-z0-9_]`, replace the rest with `_`, collapse runs of `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

fn unique_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str) -> ElementInfo {
        ElementInfo {
            path: format!("button:nth-of-type({})", text.len()),
            tag: "button".to_string(),
            text: text.to_string(),
            visible: true,
            ..ElementInfo::default()
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Modal_Save changes!"), "Modal_Save_changes_");
        assert_eq!(sanitize_name("Modal__a  --  b"), "Modal_a_b");
        assert_eq!(sanitize_name("Modal_Réserver"), "Modal_R_server");
    }

    #[test]
    fn test_generate_name_fallbacks() {
        assert_eq!(generate_name(&element("Save"), 1), "Modal_Save");

        let long = ElementInfo {
            text: "This button text is far too long to be a name".to_string(),
            aria_label: Some("Open settings".to_string()),
            ..element("")
        };
        assert_eq!(generate_name(&long, 1), "Modal_Open_settings");

        let titled = ElementInfo {
            title: Some("Filters".to_string()),
            ..element("")
        };
        assert_eq!(generate_name(&titled, 2), "Modal_Filters");

        let with_id = ElementInfo {
            id: Some("btn-export".to_string()),
            aria_label: Some("  ".to_string()),
            ..element("")
        };
        assert_eq!(generate_name(&with_id, 3), "Modal_btn_export");

        assert_eq!(generate_name(&element(""), 4), "Modal_4");
    }

    #[test]
    fn test_unique_name() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name("Modal_Edit".to_string(), &mut taken), "Modal_Edit");
        assert_eq!(unique_name("Modal_Edit".to_string(), &mut taken), "Modal_Edit_2");
        assert_eq!(unique_name("Modal_Edit".to_string(), &mut taken), "Modal_Edit_3");
    }

    #[test]
    fn test_signature_ignores_position_and_whitespace() {
        let a = ElementInfo {
            path: "tr:nth-of-type(1) > td > button".to_string(),
            text: "Edit ".to_string(),
            ..element("Edit")
        };
        let b = ElementInfo {
            path: "tr:nth-of-type(2) > td > button".to_string(),
            text: " edit".to_string(),
            ..element("Edit")
        };
        assert_eq!(signature(&a), signature(&b));
        assert_ne!(signature(&a), signature(&element("Delete")));
    }

    #[test]
    fn test_same_page() {
        assert!(same_page("http://app/dashboard/", "http://app/dashboard"));
        assert!(same_page("http://app/dashboard#tab", "http://app/dashboard"));
        assert!(!same_page("http://app/settings", "http://app/dashboard"));
    }

    #[test]
    fn test_explicit_candidate_depth_at_least_one() {
        let mut spec = ModalSpec::new("Settings", "#settings");
        spec.interaction_depth = 0;
        let candidate = ModalCandidate::explicit(&spec);
        assert_eq!(candidate.interaction_depth, 1);
        assert_eq!(candidate.origin, CandidateOrigin::Explicit);
    }
}
