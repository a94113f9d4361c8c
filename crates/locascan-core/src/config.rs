//! Scan configuration.
//!
//! A [`ScanConfig`] is loaded once, from TOML or YAML depending on the file
//! extension, validated, and then passed by reference to every component for
//! the lifetime of the run. Every section falls back to defaults so partial
//! files work.

use crate::error::{ConfigError, ConfigResult};
use crate::language;
use crate::types::PageSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Complete scan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Target application and traversal settings
    pub application: ApplicationConfig,
    /// Browser window settings
    pub browser: BrowserConfig,
    /// Pages to scan, in order
    pub pages: Vec<PageSpec>,
    /// OCR engine settings
    pub ocr: OcrConfig,
    /// Language classification settings
    pub language_detection: LanguageDetectionConfig,
    /// Where screenshots and reports go
    pub output: OutputConfig,
}

impl ScanConfig {
    /// Load configuration from a `.toml`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    /// Returns error if the file is missing, has an unknown extension, or
    /// cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Load configuration and apply environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `LOCASCAN_BASE_URL`: Override the application base URL
    /// - `LOCASCAN_HEADLESS`: Override browser headless mode (true/false)
    /// - `GOOGLE_VISION_API_KEY`: Google Cloud Vision key, used when the file has none
    pub fn load_with_env(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LOCASCAN_BASE_URL") {
            tracing::debug!("Override application.base_url from env: {}", url);
            self.application.base_url = url;
        }

        if let Some(val) = lookup("LOCASCAN_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.application.headless = headless;
                tracing::debug!("Override application.headless from env: {}", headless);
            }
        }

        if self.ocr.google_vision.api_key.is_none() {
            if let Some(key) = lookup("GOOGLE_VISION_API_KEY").filter(|k| !k.is_empty()) {
                tracing::debug!("Using Google Vision API key from environment");
                self.ocr.google_vision.api_key = Some(key);
            }
        }
    }

    /// Check the configuration before a run starts.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let app = &self.application;
        if app.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("application.base_url", "must be set"));
        }
        url::Url::parse(&app.base_url)
            .map_err(|e| ConfigError::invalid("application.base_url", e.to_string()))?;

        if app.default_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "application.default_timeout_ms",
                "must be greater than zero",
            ));
        }
        if app.modal_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "application.modal_timeout_ms",
                "must be greater than zero",
            ));
        }
        if app.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "application.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if app.max_close_attempts == 0 {
            return Err(ConfigError::invalid(
                "application.max_close_attempts",
                "must be at least 1",
            ));
        }

        if self.pages.is_empty() && !app.auto_discover_pages {
            return Err(ConfigError::invalid(
                "pages",
                "no pages configured and auto_discover_pages is off",
            ));
        }

        let mut names = HashSet::new();
        for (idx, page) in self.pages.iter().enumerate() {
            if page.name.trim().is_empty() {
                return Err(ConfigError::invalid(format!("pages[{idx}].name"), "must be set"));
            }
            if page.url_path.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("pages[{idx}].url_path"),
                    "must be set",
                ));
            }
            if !names.insert(page.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("pages[{idx}].name"),
                    format!("duplicate page name '{}'", page.name),
                ));
            }
            for (m_idx, modal) in page.explicit_modals.iter().enumerate() {
                if modal.trigger_selector.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        format!("pages[{idx}].explicit_modals[{m_idx}].trigger_selector"),
                        "must be set",
                    ));
                }
                if modal.interaction_depth == 0 {
                    return Err(ConfigError::invalid(
                        format!("pages[{idx}].explicit_modals[{m_idx}].interaction_depth"),
                        "must be at least 1",
                    ));
                }
            }
        }

        let target = self.ocr.target_language.trim();
        if target.is_empty() {
            return Err(ConfigError::invalid("ocr.target_language", "must be set"));
        }
        let target = language::canonical(target).ok_or_else(|| {
            ConfigError::invalid("ocr.target_language", format!("unknown language '{target}'"))
        })?;
        let checks = &self.language_detection.check_languages;
        if checks.is_empty() {
            return Err(ConfigError::invalid(
                "language_detection.check_languages",
                "at least one language to flag is required",
            ));
        }
        for (idx, code) in checks.iter().enumerate() {
            let field = format!("language_detection.check_languages[{idx}]");
            let check = language::canonical(code)
                .ok_or_else(|| ConfigError::invalid(&field, format!("unknown language '{code}'")))?;
            if check == target {
                return Err(ConfigError::invalid(
                    field,
                    "must not be the target language",
                ));
            }
        }

        for (field, value) in [
            ("ocr.confidence_threshold", self.ocr.confidence_threshold),
            (
                "language_detection.min_confidence",
                self.language_detection.min_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be between 0 and 1"));
            }
        }

        if self.output.formats.is_empty() {
            return Err(ConfigError::invalid(
                "output.formats",
                "at least one report format is required",
            ));
        }

        Ok(())
    }

    /// Full URL of a page. Absolute page URLs are used as-is.
    #[must_use]
    pub fn page_url(&self, page: &PageSpec) -> String {
        join_url(&self.application.base_url, &page.url_path)
    }

    /// Effective load timeout for a page.
    #[must_use]
    pub fn page_timeout_ms(&self, page: &PageSpec) -> u64 {
        page.timeout_ms.unwrap_or(self.application.default_timeout_ms)
    }

    /// Effective stabilization pause for a page.
    #[must_use]
    pub fn page_stabilization_ms(&self, page: &PageSpec) -> u64 {
        page.stabilization_ms
            .unwrap_or(self.application.stabilization_ms)
    }
}

/// Join a base URL and a path, leaving absolute URLs untouched.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_loading_indicators() -> Vec<String> {
    [
        ".spinner",
        ".loading",
        ".loader",
        "[class*=\"spinner\"]",
        "[class*=\"skeleton\"]",
        "[aria-busy=\"true\"]",
        "[role=\"progressbar\"]",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Target application and traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ApplicationConfig {
    /// Application name, shown in reports
    pub name: String,
    /// Base URL page paths are resolved against
    pub base_url: String,
    /// Page the operator logs in on before the scan starts
    pub login_url: Option<String>,
    /// Run the browser headless (manual login needs a visible window)
    pub headless: bool,
    /// Page load budget in milliseconds
    pub default_timeout_ms: u64,
    /// Quiet pause after a page or modal looks ready
    pub stabilization_ms: u64,
    /// Load budget for modals
    pub modal_timeout_ms: u64,
    /// How long the network must stay quiet to count as idle
    pub network_quiet_ms: u64,
    /// Readiness polling interval
    pub poll_interval_ms: u64,
    /// Look for modal triggers on every page
    pub auto_discover_modals: bool,
    /// Follow same-origin links to pages not in the configuration
    pub auto_discover_pages: bool,
    /// Cap on discovered modals per page
    pub max_discovered_modals: usize,
    /// Cap on discovered pages per run
    pub max_discovered_pages: usize,
    /// Close attempts per modal layer before giving up
    pub max_close_attempts: u32,
    /// Collapse repeated identical triggers (per-row buttons) into one candidate
    pub dedupe_repeated_triggers: bool,
    /// Spinner/skeleton selectors that mean "still loading"
    pub loading_indicators: Vec<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Localization Scan".to_string(),
            base_url: String::new(),
            login_url: None,
            headless: false,
            default_timeout_ms: 30_000,
            stabilization_ms: 1_000,
            modal_timeout_ms: 5_000,
            network_quiet_ms: 500,
            poll_interval_ms: 100,
            auto_discover_modals: true,
            auto_discover_pages: false,
            max_discovered_modals: 5,
            max_discovered_pages: 5,
            max_close_attempts: 3,
            dedupe_repeated_triggers: true,
            loading_indicators: default_loading_indicators(),
        }
    }
}

/// Browser window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Viewport width
    pub width: u32,
    /// Viewport height
    pub height: u32,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            user_agent: None,
        }
    }
}

/// Which OCR backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// Local Tesseract binary
    #[serde(alias = "local")]
    Tesseract,
    /// Google Cloud Vision API
    #[serde(alias = "google_cloud_vision")]
    GoogleVision,
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Backend selection
    pub engine: OcrEngineKind,
    /// ISO 639-1 code of the language the UI should be in
    pub target_language: String,
    /// Terms never flagged (brand names, universal abbreviations)
    pub allowed_terms: Vec<String>,
    /// Blocks recognized below this confidence are dropped
    pub confidence_threshold: f32,
    /// Budget for one extraction call
    pub timeout_ms: u64,
    /// Merge word-level blocks on the same visual line
    pub merge_lines: bool,
    /// Tesseract settings
    pub tesseract: TesseractConfig,
    /// Google Cloud Vision settings
    pub google_vision: GoogleVisionConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Tesseract,
            target_language: "fr".to_string(),
            allowed_terms: Vec::new(),
            confidence_threshold: 0.5,
            timeout_ms: 60_000,
            merge_lines: true,
            tesseract: TesseractConfig::default(),
            google_vision: GoogleVisionConfig::default(),
        }
    }
}

/// Tesseract settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Binary name or path
    pub binary: String,
    /// Tesseract language packs (ISO 639-2 codes, e.g. `eng`, `fra`)
    pub languages: Vec<String>,
    /// Page segmentation mode
    pub psm: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: vec!["eng".to_string(), "fra".to_string()],
            psm: 11,
        }
    }
}

/// Google Cloud Vision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleVisionConfig {
    /// API key; falls back to `GOOGLE_VISION_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Annotate endpoint
    pub endpoint: String,
    /// Use Tesseract when no API key is available
    pub fallback_to_local: bool,
}

impl Default for GoogleVisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            fallback_to_local: true,
        }
    }
}

/// Which dictionary wins when a term is in both the target and a checked dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryPrecedence {
    /// Treat the term as correctly localized
    #[default]
    TargetWins,
    /// Flag the term
    CheckedWins,
}

/// Language classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageDetectionConfig {
    /// ISO 639-1 codes whose presence means a missing translation
    pub check_languages: Vec<String>,
    /// Minimum detector confidence to flag a block
    pub min_confidence: f32,
    /// Blocks shorter than this (in characters) are never classified
    pub min_text_length: usize,
    /// Per-language term lists that override the detector
    pub custom_dictionary: BTreeMap<String, Vec<String>>,
    /// Tie-break between target and checked dictionaries
    pub dictionary_precedence: DictionaryPrecedence,
    /// Seed the target dictionary with common hospitality and UI terms
    pub builtin_terms: bool,
}

impl Default for LanguageDetectionConfig {
    fn default() -> Self {
        Self {
            check_languages: vec!["en".to_string()],
            min_confidence: 0.6,
            min_text_length: 4,
            custom_dictionary: BTreeMap::new(),
            dictionary_precedence: DictionaryPrecedence::TargetWins,
            builtin_terms: false,
        }
    }
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One row per issue
    Csv,
    /// Per-state issue counts and coverage
    SummaryCsv,
    /// Browsable report with inline screenshots
    Html,
    /// Full scan run
    Json,
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Screenshot root; each run writes to a timestamped subdirectory
    pub screenshot_dir: String,
    /// Report root; each run writes to a timestamped subdirectory
    pub reports_dir: String,
    /// Reports to emit
    pub formats: Vec<ReportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: "./screenshots".to_string(),
            reports_dir: "./reports".to_string(),
            formats: vec![
                ReportFormat::Csv,
                ReportFormat::SummaryCsv,
                ReportFormat::Html,
                ReportFormat::Json,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModalSpec;
    use tempfile::TempDir;

    fn minimal() -> ScanConfig {
        let mut config = ScanConfig::default();
        config.application.base_url = "https://app.example.com".to_string();
        config.pages.push(PageSpec::new("Dashboard", "/dashboard"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.ocr.target_language, "fr");
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.language_detection.check_languages, vec!["en"]);
        assert_eq!(config.language_detection.min_text_length, 4);
        assert_eq!(config.application.max_close_attempts, 3);
        assert!(config.application.auto_discover_modals);
        assert_eq!(config.output.formats.len(), 4);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
[application]
base_url = "https://app.example.com"
stabilization_ms = 250

[[pages]]
name = "Reservations"
url_path = "/reservations"
timeout_ms = 10000

[[pages.explicit_modals]]
name = "New booking"
trigger_selector = "button#new-booking"

[ocr]
engine = "google_vision"
allowed_terms = ["OK", "Wi-Fi"]

[language_detection.custom_dictionary]
en = ["dashboard"]
"#;

        let config = ScanConfig::from_toml_str(toml_str).expect("parse partial config");
        assert_eq!(config.application.stabilization_ms, 250);
        assert_eq!(config.application.default_timeout_ms, 30_000);
        assert_eq!(config.ocr.engine, OcrEngineKind::GoogleVision);
        assert_eq!(config.pages[0].explicit_modals[0].name, "New booking");
        assert_eq!(config.page_timeout_ms(&config.pages[0]), 10_000);
        assert_eq!(config.page_stabilization_ms(&config.pages[0]), 250);
        assert_eq!(
            config.language_detection.custom_dictionary["en"],
            vec!["dashboard"]
        );
        config.validate().expect("valid config");
    }

    #[test]
    fn test_yaml_matches_original_layout() {
        let yaml = r##"
application:
  base_url: https://app.example.com
pages:
  - name: Settings
    url: /settings
    modals:
      - name: Profile
        selector: "#profile"
ocr:
  engine: local
  target_language: de
language_detection:
  check_languages: [en, fr]
  min_confidence: 0.8
"##;
        let config = ScanConfig::from_yaml_str(yaml).expect("parse yaml");
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.ocr.target_language, "de");
        assert_eq!(config.pages[0].explicit_modals[0], ModalSpec::new("Profile", "#profile"));
        config.validate().expect("valid yaml config");
    }

    #[test]
    fn test_load_by_extension() {
        let tmp = TempDir::new().expect("create temp dir");
        let toml_path = tmp.path().join("scan.toml");
        fs::write(
            &toml_path,
            "[application]\nbase_url = \"https://x.example\"\n",
        )
        .expect("write toml");
        let config = ScanConfig::load(&toml_path).expect("load toml");
        assert_eq!(config.application.base_url, "https://x.example");

        let ini_path = tmp.path().join("scan.ini");
        fs::write(&ini_path, "").expect("write ini");
        assert!(matches!(
            ScanConfig::load(&ini_path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        assert!(matches!(
            ScanConfig::load(tmp.path().join("missing.yaml")),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = minimal();
        config.apply_env(|name| match name {
            "LOCASCAN_BASE_URL" => Some("https://staging.example.com".to_string()),
            "LOCASCAN_HEADLESS" => Some("true".to_string()),
            "GOOGLE_VISION_API_KEY" => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.application.base_url, "https://staging.example.com");
        assert!(config.application.headless);
        assert_eq!(config.ocr.google_vision.api_key.as_deref(), Some("secret"));

        config.ocr.google_vision.api_key = Some("from-file".to_string());
        config.apply_env(|name| (name == "GOOGLE_VISION_API_KEY").then(|| "env".to_string()));
        assert_eq!(config.ocr.google_vision.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = minimal();
        config.application.base_url = String::new();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.language_detection.check_languages = vec!["fr".to_string()];
        let err = config.validate().expect_err("target in check list");
        assert!(err.to_string().contains("check_languages"));

        let mut config = minimal();
        config.ocr.target_language = "fra".to_string();
        config.language_detection.check_languages = vec!["en".to_string(), "FR".to_string()];
        let err = config.validate().expect_err("target in check list under another code");
        assert!(err.to_string().contains("check_languages[1]"));

        let mut config = minimal();
        config.language_detection.check_languages = vec!["en".to_string(), "xx".to_string()];
        let err = config.validate().expect_err("unknown check language");
        assert!(err.to_string().contains("unknown language 'xx'"));

        let mut config = minimal();
        config.ocr.target_language = "klingon".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.pages.push(PageSpec::new("Dashboard", "/other"));
        let err = config.validate().expect_err("duplicate page");
        assert!(err.to_string().contains("duplicate page name"));

        let mut config = minimal();
        config.pages.clear();
        assert!(config.validate().is_err());
        config.application.auto_discover_pages = true;
        config.validate().expect("discovery-only config is valid");

        let mut config = minimal();
        config.language_detection.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_url() {
        let config = minimal();
        assert_eq!(
            config.page_url(&PageSpec::new("a", "settings/profile")),
            "https://app.example.com/settings/profile"
        );
        assert_eq!(
            config.page_url(&PageSpec::new("b", "https://other.example.com/x")),
            "https://other.example.com/x"
        );
        assert_eq!(join_url("https://a.example/", "/b"), "https://a.example/b");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = minimal();
        config.ocr.google_vision.api_key = Some("secret".to_string());
        let out = toml::to_string_pretty(&config).expect("serialize config");
        assert!(!out.contains("secret"));
    }
}
