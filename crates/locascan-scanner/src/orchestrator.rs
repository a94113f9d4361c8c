//! Scan orchestrator: drives pages and modals through capture and analysis.
//!
//! For every page the orchestrator navigates, verifies the page is stable,
//! captures it, runs OCR and classification, and then works through the
//! page's modal candidates one at a time. Every attempted visual state ends
//! up in the coverage ledger. Failures are scoped to the state they happened
//! in; only configuration errors and an unreachable application abort a run.

use crate::error::{Result, ScanError};
use crate::modal::{CloseOutcome, ModalCandidate, ModalDiscoveryEngine, OpenOutcome};
use crate::screenshots::ScreenshotStore;
use crate::verifier::{LoadBudget, LoadOutcome, PageLoadVerifier, VerifyScope};
use locascan_browser::{same_origin_path, BrowserActions};
use locascan_core::{
    CoverageEntry, CoveragePhase, FailureReason, Issue, PageSpec, ScanConfig, ScanRun, VisualState,
};
use locascan_lang::Classifier;
use locascan_ocr::OcrAdapter;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Selector for links considered during page discovery.
const LINK_SELECTOR: &str = "a[href]";

/// Per-run helpers built from the configuration.
struct RunContext<'a> {
    config: &'a ScanConfig,
    verifier: PageLoadVerifier,
    modals: ModalDiscoveryEngine,
}

/// Orchestrates a localization scan over one browser session.
pub struct ScanOrchestrator {
    browser: Arc<dyn BrowserActions>,
    ocr: OcrAdapter,
    classifier: Classifier,
    store: ScreenshotStore,
    cancel: CancellationToken,
}

impl ScanOrchestrator {
    /// Create a new scan orchestrator.
    #[must_use]
    pub fn new(
        browser: Arc<dyn BrowserActions>,
        ocr: OcrAdapter,
        classifier: Classifier,
        store: ScreenshotStore,
    ) -> Self {
        Self {
            browser,
            ocr,
            classifier,
            store,
            cancel: CancellationToken::new(),
        }
    }

    /// Build the OCR adapter and classifier from configuration.
    ///
    /// # Errors
    /// Returns error if the OCR backend or classifier cannot be constructed.
    pub fn from_config(
        browser: Arc<dyn BrowserActions>,
        config: &ScanConfig,
        store: ScreenshotStore,
    ) -> Result<Self> {
        let ocr = OcrAdapter::from_config(&config.ocr)?;
        let classifier = Classifier::from_scan_config(config)?;
        Ok(Self::new(browser, ocr, classifier, store))
    }

    /// Use an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this orchestrator's runs.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a full scan.
    ///
    /// Returns the run even when individual states failed; check the ledger.
    /// A cancelled run is returned partially filled with `cancelled` set.
    ///
    /// # Errors
    /// Returns [`ScanError::Config`] if the configuration is invalid and
    /// [`ScanError::Unreachable`] if the base URL cannot be loaded.
    pub async fn run(&self, config: &ScanConfig) -> Result<ScanRun> {
        config.validate()?;

        let base_url = config.application.base_url.clone();
        tracing::info!("Probing {}", base_url);
        self.browser
            .navigate(&base_url)
            .await
            .map_err(|e| ScanError::Unreachable {
                url: base_url.clone(),
                message: e.to_string(),
            })?;

        let ctx = RunContext {
            config,
            verifier: PageLoadVerifier::from_config(&config.application),
            modals: ModalDiscoveryEngine::from_config(&config.application),
        };
        let mut run = ScanRun::new(
            self.classifier.target_language(),
            self.classifier.check_languages().to_vec(),
        );
        tracing::info!(
            "Scan {} started: {} page(s), OCR backend {}",
            run.run_id,
            config.pages.len(),
            self.ocr.backend_id()
        );

        let mut visited: HashSet<String> =
            config.pages.iter().map(|p| path_key(&p.url_path)).collect();
        let mut discovered: Vec<String> = Vec::new();

        for (i, page) in config.pages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                Self::skip_pages(&mut run, &config.pages[i..]);
                break;
            }
            let navigated = self.scan_page(&ctx, page, &mut run).await;
            if navigated && config.application.auto_discover_pages {
                self.collect_links(&base_url, &visited, &mut discovered)
                    .await;
            }
        }

        if config.application.auto_discover_pages {
            let pages = discovered_pages(
                &discovered,
                config.application.max_discovered_pages,
                &config.pages,
            );
            tracing::info!("{} discovered page(s) to scan", pages.len());
            for (i, page) in pages.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    Self::skip_pages(&mut run, &pages[i..]);
                    break;
                }
                visited.insert(path_key(&page.url_path));
                self.scan_page(&ctx, page, &mut run).await;
            }
        }

        run.cancelled = self.cancel.is_cancelled();
        run.finish();

        let summary = run.summary();
        tracing::info!(
            "Scan {} finished{}: {} state(s) captured, {} issue(s), {} failed, {} skipped",
            run.run_id,
            if run.cancelled { " (cancelled)" } else { "" },
            summary.states_captured,
            summary.issues,
            summary.failed_states,
            summary.skipped_states
        );
        Ok(run)
    }

    fn skip_pages(run: &mut ScanRun, pages: &[PageSpec]) {
        tracing::warn!("Scan cancelled, skipping {} page(s)", pages.len());
        for page in pages {
            run.record_coverage(CoverageEntry::skipped(
                &page.name,
                None,
                CoveragePhase::Capture,
                FailureReason::Cancelled,
            ));
        }
    }

    /// Scan one page and its modals. Returns false when the page could not
    /// be loaded at all.
    async fn scan_page(&self, ctx: &RunContext<'_>, page: &PageSpec, run: &mut ScanRun) -> bool {
        let url = ctx.config.page_url(page);
        tracing::info!("Scanning page {} ({})", page.name, url);

        if let Err(e) = self.browser.navigate(&url).await {
            tracing::warn!("Skipping page {}: {}", page.name, e);
            run.record_coverage(CoverageEntry::failed(
                &page.name,
                None,
                CoveragePhase::Capture,
                FailureReason::NavigationError,
                Some(e.to_string()),
            ));
            return false;
        }

        let load = ctx
            .verifier
            .verify_within(
                self.browser.as_ref(),
                &VerifyScope::Page,
                LoadBudget::for_page(ctx.config, page),
            )
            .await;
        self.capture_page(page, load, run).await;

        let candidates = ctx
            .modals
            .discover(self.browser.as_ref(), &page.explicit_modals)
            .await;

        for (i, candidate) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                for skipped in &candidates[i..] {
                    run.record_coverage(CoverageEntry::skipped(
                        &page.name,
                        Some(&skipped.name),
                        CoveragePhase::Capture,
                        FailureReason::Cancelled,
                    ));
                }
                return true;
            }

            if !self.scan_modal(ctx, page, &url, candidate, run).await {
                for skipped in &candidates[i + 1..] {
                    run.record_coverage(CoverageEntry::skipped(
                        &page.name,
                        Some(&skipped.name),
                        CoveragePhase::Capture,
                        FailureReason::NavigationError,
                    ));
                }
                return true;
            }
        }
        true
    }

    async fn capture_page(&self, page: &PageSpec, load: LoadOutcome, run: &mut ScanRun) {
        let screenshot = match self.browser.screenshot().await {
            Ok(png) => self.store.save(&page.name, false, &png).await,
            Err(e) => Err(ScanError::Capture(e.to_string())),
        };

        match screenshot {
            Ok(screenshot) => {
                let state = VisualState::new(&page.name, None, screenshot);
                run.record_state(state.clone());
                self.analyze(&state, load, run).await;
            }
            Err(e) => {
                tracing::warn!("Could not capture page {}: {}", page.name, e);
                run.record_coverage(CoverageEntry::failed(
                    &page.name,
                    None,
                    CoveragePhase::Capture,
                    FailureReason::CaptureError,
                    Some(e.to_string()),
                ));
            }
        }
    }

    /// Open, capture and close one modal. Returns false when the page could
    /// not be brought back and the remaining candidates must be skipped.
    async fn scan_modal(
        &self,
        ctx: &RunContext<'_>,
        page: &PageSpec,
        page_url: &str,
        candidate: &ModalCandidate,
        run: &mut ScanRun,
    ) -> bool {
        let browser = self.browser.as_ref();
        let modal = Some(candidate.name.as_str());

        let baseline = match ctx
            .modals
            .open(browser, candidate, &page.name, &self.store)
            .await
        {
            OpenOutcome::Opened {
                state,
                load,
                baseline,
            } => {
                run.record_state(state.clone());
                self.analyze(&state, load, run).await;
                baseline
            }
            OpenOutcome::CaptureFailed { reason, baseline } => {
                tracing::warn!("Could not capture modal {}: {}", candidate.name, reason);
                run.record_coverage(CoverageEntry::failed(
                    &page.name,
                    modal,
                    CoveragePhase::Capture,
                    FailureReason::CaptureError,
                    Some(reason),
                ));
                baseline
            }
            OpenOutcome::NotOpened { reason, baseline } => {
                tracing::info!("Modal {} did not open: {}", candidate.name, reason);
                run.record_coverage(CoverageEntry::failed(
                    &page.name,
                    modal,
                    CoveragePhase::Capture,
                    FailureReason::ModalNotOpened,
                    Some(reason),
                ));
                baseline
            }
        };

        let budget = LoadBudget::for_page(ctx.config, page);
        match ctx
            .modals
            .close(browser, candidate, page_url, baseline, budget)
            .await
        {
            CloseOutcome::Closed {
                load: LoadOutcome::Stable,
            } => {
                run.record_coverage(CoverageEntry::success(
                    &page.name,
                    modal,
                    CoveragePhase::Restore,
                ));
                true
            }
            CloseOutcome::Closed {
                load: LoadOutcome::TimedOut { stage },
            } => {
                run.record_coverage(CoverageEntry::failed(
                    &page.name,
                    modal,
                    CoveragePhase::Restore,
                    FailureReason::LoadTimeout,
                    Some(format!("timed out waiting for {stage}")),
                ));
                true
            }
            CloseOutcome::StuckOpen { attempts } => {
                tracing::warn!(
                    "Modal {} stuck open, reloading {}",
                    candidate.name,
                    page_url
                );
                let mut detail = format!("still open after {attempts} close attempt(s)");
                let restored = match browser.navigate(page_url).await {
                    Ok(()) => {
                        match ctx
                            .verifier
                            .verify_within(browser, &VerifyScope::Page, budget)
                            .await
                        {
                            LoadOutcome::Stable => detail.push_str("; page reloaded"),
                            LoadOutcome::TimedOut { stage } => detail.push_str(&format!(
                                "; page reloaded but timed out waiting for {stage}"
                            )),
                        }
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Could not reload {}: {}", page_url, e);
                        detail.push_str(&format!("; reload failed: {e}"));
                        false
                    }
                };
                run.record_coverage(CoverageEntry::failed(
                    &page.name,
                    modal,
                    CoveragePhase::Restore,
                    FailureReason::ModalStuckOpen,
                    Some(detail),
                ));
                restored
            }
        }
    }

    /// OCR and classify a captured state, then record its capture entry.
    async fn analyze(&self, state: &VisualState, load: LoadOutcome, run: &mut ScanRun) {
        let page = state.page_name.as_str();
        let modal = state.modal_name.as_deref();

        let blocks = match self.ocr.extract(&state.screenshot_ref).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!("OCR failed for {}: {}", state.label(), e);
                let mut detail = e.to_string();
                if let LoadOutcome::TimedOut { stage } = load {
                    detail.push_str(&format!("; load also timed out waiting for {stage}"));
                }
                run.record_coverage(CoverageEntry::failed(
                    page,
                    modal,
                    CoveragePhase::Capture,
                    FailureReason::OcrError,
                    Some(detail),
                ));
                return;
            }
        };

        let mut found = 0;
        for classified in self.classifier.classify_all(&blocks) {
            let Some(issue) = Issue::from_classified(state, &classified) else {
                continue;
            };
            tracing::info!(
                "Missing translation on {}: '{}' (detected as {})",
                state.label(),
                issue.text_snippet,
                issue.detected_language
            );
            match run.add_issue(issue) {
                Ok(()) => found += 1,
                Err(e) => tracing::warn!("Dropped issue: {}", e),
            }
        }
        tracing::info!(
            "{}: {} text block(s), {} issue(s)",
            state.label(),
            blocks.len(),
            found
        );

        run.record_coverage(match load {
            LoadOutcome::Stable => CoverageEntry::success(page, modal, CoveragePhase::Capture),
            LoadOutcome::TimedOut { stage } => CoverageEntry::failed(
                page,
                modal,
                CoveragePhase::Capture,
                FailureReason::LoadTimeout,
                Some(format!("timed out waiting for {stage}")),
            ),
        });
    }

    /// Remember same-origin links on the current page for later scanning.
    async fn collect_links(
        &self,
        base_url: &str,
        visited: &HashSet<String>,
        discovered: &mut Vec<String>,
    ) {
        let page_url = self.browser.current_url().await.unwrap_or_default();
        let links = match self.browser.query_elements(LINK_SELECTOR).await {
            Ok(links) => links,
            Err(e) => {
                tracing::debug!("Link discovery failed: {}", e);
                return;
            }
        };
        for href in links.into_iter().filter_map(|l| l.href) {
            let Some(path) = same_origin_path(base_url, &page_url, &href) else {
                continue;
            };
            let key = path_key(&path);
            if !visited.contains(&key) && !discovered.iter().any(|d| path_key(d) == key) {
                discovered.push(path);
            }
        }
        tracing::debug!("{} page(s) discovered so far", discovered.len());
    }
}

/// Comparable form of a URL path.
fn path_key(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Page specs for discovered paths, named after the path.
fn discovered_pages(paths: &[String], max: usize, configured: &[PageSpec]) -> Vec<PageSpec> {
    let mut names: HashSet<String> = configured.iter().map(|p| p.name.clone()).collect();
    paths
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, path)| {
            let mut name = path.replace('/', "_").trim_matches('_').to_string();
            if name.is_empty() {
                name = format!("DiscoveredPage_{}", i + 1);
            }
            let mut unique = name.clone();
            let mut n = 2;
            while !names.insert(unique.clone()) {
                unique = format!("{name}_{n}");
                n += 1;
            }
            PageSpec::new(unique, path.clone())
        })
        .collect()
}
