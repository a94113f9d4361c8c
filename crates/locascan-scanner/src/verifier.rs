//! Page load verification.
//!
//! Before a screenshot is taken the page (or an open dialog) must look
//! settled. The verifier runs four checks in a fixed order, each bounded:
//!
//! 1. network idle: the loaded-resource count stops changing for a quiet window
//! 2. DOM ready: `document.readyState` is interactive/complete, or for a
//!    dialog, its container is visible
//! 3. loading indicators gone: no visible spinner/skeleton element
//! 4. a fixed stabilization pause
//!
//! Checks 1-3 share `timeout - stabilization`, split 40/20/40. Each check
//! samples at least once, so a settled page passes even with a zero budget.
//! A check that runs out of budget ends verification with
//! [`LoadOutcome::TimedOut`].

use locascan_browser::BrowserActions;
use locascan_core::{ApplicationConfig, PageSpec, ScanConfig};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// What to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyScope {
    /// The whole document
    Page,
    /// A dialog container, addressed by a CSS selector
    Container(String),
}

/// Readiness check that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Resources kept loading
    NetworkIdle,
    /// Document (or container) never became ready
    DomReady,
    /// A loading indicator stayed visible
    LoadingIndicators,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkIdle => write!(f, "network idle"),
            Self::DomReady => write!(f, "DOM ready"),
            Self::LoadingIndicators => write!(f, "loading indicators"),
        }
    }
}

/// Result of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// All checks passed
    Stable,
    /// A check exceeded its budget
    TimedOut {
        /// Failing check
        stage: LoadStage,
    },
}

/// Time allowed for one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBudget {
    /// Overall limit, stabilization included
    pub timeout: Duration,
    /// Quiet pause after the readiness checks
    pub stabilization: Duration,
}

impl LoadBudget {
    /// Budget for a page, honoring its per-page overrides.
    #[must_use]
    pub fn for_page(config: &ScanConfig, page: &PageSpec) -> Self {
        Self {
            timeout: Duration::from_millis(config.page_timeout_ms(page)),
            stabilization: Duration::from_millis(config.page_stabilization_ms(page)),
        }
    }
}

/// Readiness state machine run after every navigation or interaction.
#[derive(Debug, Clone)]
pub struct PageLoadVerifier {
    network_quiet: Duration,
    poll_interval: Duration,
    loading_indicators: Vec<String>,
}

impl PageLoadVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(
        network_quiet: Duration,
        poll_interval: Duration,
        loading_indicators: Vec<String>,
    ) -> Self {
        Self {
            network_quiet,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            loading_indicators,
        }
    }

    /// Create a verifier from the application settings.
    #[must_use]
    pub fn from_config(config: &ApplicationConfig) -> Self {
        Self::new(
            Duration::from_millis(config.network_quiet_ms),
            Duration::from_millis(config.poll_interval_ms),
            config.loading_indicators.clone(),
        )
    }

    /// Poll interval between samples.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run all readiness checks within a [`LoadBudget`].
    pub async fn verify_within(
        &self,
        browser: &dyn BrowserActions,
        scope: &VerifyScope,
        budget: LoadBudget,
    ) -> LoadOutcome {
        self.verify(browser, scope, budget.timeout, budget.stabilization)
            .await
    }

    /// Run all readiness checks.
    pub async fn verify(
        &self,
        browser: &dyn BrowserActions,
        scope: &VerifyScope,
        timeout: Duration,
        stabilization: Duration,
    ) -> LoadOutcome {
        let budget = timeout.saturating_sub(stabilization);
        let deadline = Instant::now() + budget;

        let network_deadline = (Instant::now() + budget.mul_f32(0.4)).min(deadline);
        if !self.wait_network_idle(browser, network_deadline).await {
            return Self::timed_out(LoadStage::NetworkIdle, scope);
        }

        let dom_deadline = (Instant::now() + budget.mul_f32(0.2)).min(deadline);
        if !self.wait_dom_ready(browser, scope, dom_deadline).await {
            return Self::timed_out(LoadStage::DomReady, scope);
        }

        let indicator_deadline = (Instant::now() + budget.mul_f32(0.4)).min(deadline);
        if !self
            .wait_indicators_gone(browser, scope, indicator_deadline)
            .await
        {
            return Self::timed_out(LoadStage::LoadingIndicators, scope);
        }

        tokio::time::sleep(stabilization).await;
        tracing::debug!("{:?} stable", scope);
        LoadOutcome::Stable
    }

    fn timed_out(stage: LoadStage, scope: &VerifyScope) -> LoadOutcome {
        tracing::warn!("{:?} did not stabilize: timed out waiting for {}", scope, stage);
        LoadOutcome::TimedOut { stage }
    }

    /// Sleep one poll interval, or until the deadline if that comes first.
    /// Returns false when the deadline has passed.
    async fn tick(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        true
    }

    /// The quiet window shrinks to the stage budget, so a page whose resource
    /// count holds steady for every sample that fits counts as idle.
    async fn wait_network_idle(&self, browser: &dyn BrowserActions, deadline: Instant) -> bool {
        let quiet = self
            .network_quiet
            .min(deadline.saturating_duration_since(Instant::now()));
        let mut last = sample_resources(browser).await;
        let mut quiet_since = Instant::now();

        loop {
            if last.is_some() && quiet_since.elapsed() >= quiet {
                return true;
            }
            if !self.tick(deadline).await {
                return false;
            }
            let current = sample_resources(browser).await;
            if current.is_none() || current != last {
                last = current;
                quiet_since = Instant::now();
            }
        }
    }

    async fn wait_dom_ready(
        &self,
        browser: &dyn BrowserActions,
        scope: &VerifyScope,
        deadline: Instant,
    ) -> bool {
        loop {
            let ready = match scope {
                VerifyScope::Page => match browser.ready_state().await {
                    Ok(state) => state == "interactive" || state == "complete",
                    Err(e) => {
                        tracing::debug!("readyState query failed: {}", e);
                        false
                    }
                },
                VerifyScope::Container(selector) => match browser.visible_count(selector).await {
                    Ok(count) => count > 0,
                    Err(e) => {
                        tracing::debug!("Container query failed: {}", e);
                        false
                    }
                },
            };
            if ready {
                return true;
            }
            if !self.tick(deadline).await {
                return false;
            }
        }
    }

    async fn wait_indicators_gone(
        &self,
        browser: &dyn BrowserActions,
        scope: &VerifyScope,
        deadline: Instant,
    ) -> bool {
        let Some(selector) = self.indicator_selector(scope) else {
            return true;
        };
        let mut seen = false;

        loop {
            match browser.visible_count(&selector).await {
                Ok(0) => {
                    if seen {
                        tracing::debug!("Loading indicators disappeared");
                    }
                    return true;
                }
                Ok(count) => {
                    seen = true;
                    tracing::debug!("{} loading indicator(s) visible", count);
                }
                Err(e) => tracing::debug!("Indicator query failed: {}", e),
            }
            if !self.tick(deadline).await {
                return false;
            }
        }
    }

    /// Combined indicator selector, scoped under the container for dialogs.
    fn indicator_selector(&self, scope: &VerifyScope) -> Option<String> {
        if self.loading_indicators.is_empty() {
            return None;
        }
        let parts: Vec<String> = match scope {
            VerifyScope::Page => self.loading_indicators.clone(),
            VerifyScope::Container(container) => container
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .flat_map(|c| {
                    self.loading_indicators
                        .iter()
                        .map(move |indicator| format!("{c} {indicator}"))
                })
                .collect(),
        };
        Some(parts.join(", "))
    }
}

async fn sample_resources(browser: &dyn BrowserActions) -> Option<u64> {
    match browser.resource_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::debug!("Resource count query failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> PageLoadVerifier {
        PageLoadVerifier::new(
            Duration::from_millis(500),
            Duration::from_millis(100),
            vec![".spinner".to_string(), "[aria-busy=\"true\"]".to_string()],
        )
    }

    #[test]
    fn test_indicator_selector_scoping() {
        let v = verifier();
        assert_eq!(
            v.indicator_selector(&VerifyScope::Page).as_deref(),
            Some(".spinner, [aria-busy=\"true\"]")
        );
        assert_eq!(
            v.indicator_selector(&VerifyScope::Container(".modal, [role=\"dialog\"]".to_string()))
                .as_deref(),
            Some(
                ".modal .spinner, .modal [aria-busy=\"true\"], [role=\"dialog\"] .spinner, [role=\"dialog\"] [aria-busy=\"true\"]"
            )
        );

        let bare = PageLoadVerifier::new(Duration::ZERO, Duration::ZERO, Vec::new());
        assert!(bare.indicator_selector(&VerifyScope::Page).is_none());
        assert_eq!(bare.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(LoadStage::LoadingIndicators.to_string(), "loading indicators");
    }
}
