//! In-memory browser and OCR doubles for scanner tests.

#![allow(dead_code)]

use async_trait::async_trait;
use locascan_browser::{BrowserActions, BrowserError, ElementInfo};
use locascan_core::{BoundingRegion, PageSpec, ScanConfig, TextBlock};
use locascan_lang::{Classifier, ClassifierConfig, Detection, LanguageDetector};
use locascan_ocr::{BackendCapabilities, Normalizer, OcrAdapter, OcrBackend, OcrError};
use locascan_scanner::{ModalDiscoveryEngine, ScanOrchestrator, ScreenshotStore, TRIGGER_SELECTORS};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const BASE: &str = "http://app.test";

pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

/// What clicking a trigger does.
#[derive(Debug, Clone)]
pub enum Dialog {
    /// Opens this many stacked layers, each closable with Escape
    Opens(usize),
    /// Opens one layer that ignores Escape and close buttons
    Stuck,
    /// Navigates to another URL
    Navigates(String),
}

/// Per-URL page behaviour.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Spinner never goes away
    pub spinner_forever: bool,
    /// Spinner visible for this many indicator queries
    pub spinner_polls: usize,
    /// Elements returned by trigger discovery
    pub triggers: Vec<ElementInfo>,
    /// `href`s of links on the page
    pub links: Vec<String>,
}

#[derive(Default)]
struct State {
    url: String,
    dialogs: Vec<bool>,
    indicator_queries: usize,
    resources: u64,
    navigations: Vec<String>,
    clicks: Vec<String>,
    escapes: usize,
}

/// Scripted [`BrowserActions`] implementation.
#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    unreachable: HashSet<String>,
    triggers: HashMap<String, Dialog>,
    busy_network: bool,
    state: Mutex<State>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, page: FakePage) -> Self {
        self.pages.insert(url(path), page);
        self
    }

    pub fn unreachable(mut self, full_url: &str) -> Self {
        self.unreachable.insert(full_url.to_string());
        self
    }

    pub fn trigger(mut self, selector: &str, dialog: Dialog) -> Self {
        self.triggers.insert(selector.to_string(), dialog);
        self
    }

    pub fn busy_network(mut self) -> Self {
        self.busy_network = true;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn escapes(&self) -> usize {
        self.state.lock().unwrap().escapes
    }

    pub fn open_dialogs(&self) -> usize {
        self.state.lock().unwrap().dialogs.len()
    }

    pub fn set_url(&self, full_url: &str) {
        self.state.lock().unwrap().url = full_url.to_string();
    }

    fn current_page(&self, state: &State) -> FakePage {
        self.pages.get(&state.url).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserActions for FakeBrowser {
    async fn navigate(&self, url: &str) -> locascan_browser::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if self.unreachable.contains(url) {
            return Err(BrowserError::NavigationError(format!("{url}: connection refused")));
        }
        state.url = url.to_string();
        state.dialogs.clear();
        state.indicator_queries = 0;
        Ok(())
    }

    async fn click(&self, selector: &str) -> locascan_browser::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());
        match self.triggers.get(selector) {
            Some(Dialog::Opens(layers)) => {
                for _ in 0..*layers {
                    state.dialogs.push(false);
                }
            }
            Some(Dialog::Stuck) => state.dialogs.push(true),
            Some(Dialog::Navigates(target)) => state.url = target.clone(),
            None => {}
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> locascan_browser::Result<()> {
        let mut state = self.state.lock().unwrap();
        if key == "Escape" {
            state.escapes += 1;
            if state.dialogs.last() == Some(&false) {
                state.dialogs.pop();
            }
        }
        Ok(())
    }

    async fn screenshot(&self) -> locascan_browser::Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n".to_vec())
    }

    async fn current_url(&self) -> locascan_browser::Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn ready_state(&self) -> locascan_browser::Result<String> {
        Ok("complete".to_string())
    }

    async fn resource_count(&self) -> locascan_browser::Result<u64> {
        let mut state = self.state.lock().unwrap();
        if self.busy_network {
            state.resources += 1;
        }
        Ok(state.resources)
    }

    async fn visible_count(&self, selector: &str) -> locascan_browser::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if selector == ModalDiscoveryEngine::container_selector() {
            return Ok(state.dialogs.len());
        }
        if selector.contains(".spinner") {
            let page = self.current_page(&state);
            if page.spinner_forever {
                return Ok(1);
            }
            if state.indicator_queries < page.spinner_polls {
                state.indicator_queries += 1;
                return Ok(1);
            }
        }
        Ok(0)
    }

    async fn query_elements(&self, selector: &str) -> locascan_browser::Result<Vec<ElementInfo>> {
        let state = self.state.lock().unwrap();
        let page = self.current_page(&state);
        if selector == "a[href]" {
            return Ok(page
                .links
                .iter()
                .map(|href| ElementInfo {
                    tag: "a".to_string(),
                    href: Some(href.clone()),
                    visible: true,
                    ..ElementInfo::default()
                })
                .collect());
        }
        if selector == TRIGGER_SELECTORS.join(", ") {
            return Ok(page.triggers);
        }
        if self.triggers.contains_key(selector) {
            return Ok(vec![trigger_element(selector, "")]);
        }
        Ok(Vec::new())
    }
}

/// A visible button addressed by `path`.
pub fn trigger_element(path: &str, text: &str) -> ElementInfo {
    ElementInfo {
        path: path.to_string(),
        tag: "button".to_string(),
        text: text.to_string(),
        visible: true,
        ..ElementInfo::default()
    }
}

/// What the OCR double returns for screenshots whose file name contains a needle.
pub enum Script {
    Text(Vec<&'static str>),
    Fail,
    /// Cancel the run while this screenshot is analyzed
    Cancel(CancellationToken),
}

/// Scripted [`OcrBackend`]; the first matching needle wins.
#[derive(Default)]
pub struct ScriptedOcr {
    rules: Vec<(String, Script)>,
}

impl ScriptedOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, script: Script) -> Self {
        self.rules.push((needle.to_string(), script));
        self
    }
}

#[async_trait]
impl OcrBackend for ScriptedOcr {
    async fn extract(&self, image: &Path) -> locascan_ocr::Result<Vec<TextBlock>> {
        let name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        for (needle, script) in &self.rules {
            if name.contains(needle.as_str()) {
                return match script {
                    Script::Fail => Err(OcrError::ExtractionFailed {
                        backend: "scripted".to_string(),
                        message: "engine crashed".to_string(),
                    }),
                    Script::Cancel(token) => {
                        token.cancel();
                        Ok(Vec::new())
                    }
                    Script::Text(lines) => Ok(lines
                        .iter()
                        .enumerate()
                        .map(|(i, text)| {
                            #[allow(clippy::cast_precision_loss)]
                            let y = i as f32 * 40.0;
                            TextBlock::new(*text, BoundingRegion::new(10.0, y, 200.0, 24.0), 0.95)
                        })
                        .collect()),
                };
            }
        }
        Ok(Vec::new())
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            is_local: true,
            word_level: false,
        }
    }

    fn backend_id(&self) -> &str {
        "scripted"
    }
}

/// Detector that calls everything French, so only dictionaries flag text.
struct FrenchDetector;

impl LanguageDetector for FrenchDetector {
    fn detect(&self, _text: &str) -> Option<Detection> {
        Some(Detection {
            language: "fr".to_string(),
            confidence: 0.99,
        })
    }
}

pub fn classifier() -> Classifier {
    let mut config = ClassifierConfig {
        allowed_terms: vec!["OK".to_string()],
        ..ClassifierConfig::default()
    };
    config.dictionary.insert(
        "en".to_string(),
        vec!["dashboard".to_string(), "save changes".to_string()],
    );
    Classifier::with_detector("fr", &["en".to_string()], &config, Arc::new(FrenchDetector))
        .expect("classifier")
}

pub fn orchestrator(browser: Arc<FakeBrowser>, ocr: ScriptedOcr, dir: &Path) -> ScanOrchestrator {
    let adapter = OcrAdapter::new(Arc::new(ocr), Normalizer::default(), Duration::from_secs(60));
    ScanOrchestrator::new(browser, adapter, classifier(), ScreenshotStore::new(dir))
}

pub fn config(pages: Vec<PageSpec>) -> ScanConfig {
    let mut config = ScanConfig::default();
    config.application.base_url = BASE.to_string();
    config.pages = pages;
    config
}
