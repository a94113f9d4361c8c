//! Statistical language identification.

use crate::error::{LangError, Result};
use locascan_core::language;
use whatlang::Lang;

/// Result of identifying a text's language.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-1 code when one exists, else ISO 639-3
    pub language: String,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
}

/// Identifies the language of a piece of text.
///
/// Implementations must be deterministic: the same text always yields the
/// same detection.
pub trait LanguageDetector: Send + Sync {
    /// Best guess for `text`, or `None` when the detector has no opinion.
    fn detect(&self, text: &str) -> Option<Detection>;
}

/// Map a configured language code to a whatlang language.
///
/// Accepts ISO 639-1 (`"fr"`) and ISO 639-3 (`"fra"`) codes, case-insensitively.
///
/// # Errors
/// Returns [`LangError::UnsupportedLanguage`] for unknown codes.
pub fn to_whatlang(code: &str) -> Result<Lang> {
    language::lookup(code).ok_or_else(|| LangError::UnsupportedLanguage(code.trim().to_lowercase()))
}

/// [`LanguageDetector`] backed by the `whatlang` trigram model.
///
/// Detection is restricted to an allowlist, normally the target language
/// plus the checked languages, so the detector never guesses a language
/// nobody asked about.
pub struct WhatlangDetector {
    detector: whatlang::Detector,
}

impl WhatlangDetector {
    /// Create a detector limited to `languages`.
    ///
    /// # Errors
    /// Returns [`LangError::UnsupportedLanguage`] if any code is unknown.
    pub fn new<S: AsRef<str>>(languages: &[S]) -> Result<Self> {
        let mut allowlist = Vec::with_capacity(languages.len());
        for code in languages {
            let lang = to_whatlang(code.as_ref())?;
            if !allowlist.contains(&lang) {
                allowlist.push(lang);
            }
        }
        tracing::debug!("Language detector restricted to {:?}", allowlist);
        Ok(Self {
            detector: whatlang::Detector::with_allowlist(allowlist),
        })
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<Detection> {
        let info = self.detector.detect(text)?;
        #[allow(clippy::cast_possible_truncation)]
        let confidence = info.confidence() as f32;
        Some(Detection {
            language: language::code_of(info.lang()),
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}
