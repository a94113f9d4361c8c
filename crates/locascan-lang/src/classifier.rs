//! The classification pipeline: one verdict per text block.

use crate::allowlist::AllowList;
use crate::detector::{LanguageDetector, WhatlangDetector};
use crate::dictionary::Dictionary;
use crate::error::Result;
use locascan_core::language;
use locascan_core::{
    ClassificationRule, ClassifiedBlock, DictionaryPrecedence, ScanConfig, TextBlock, Verdict,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Case-fold, collapse whitespace and trim.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical form of a configured language code ("FRA" and "fr" both become "fr").
fn canonical_code(code: &str) -> String {
    language::canonical(code).unwrap_or_else(|| code.trim().to_lowercase())
}

/// Tunables for a [`Classifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Terms that are never flagged
    pub allowed_terms: Vec<String>,
    /// Detector confidence needed to flag
    pub min_confidence: f32,
    /// Shorter normalized text is always clean
    pub min_text_length: usize,
    /// Known terms per language
    pub dictionary: BTreeMap<String, Vec<String>>,
    /// Which dictionary wins when both contain a term
    pub dictionary_precedence: DictionaryPrecedence,
    /// Seed the target dictionary with built-in UI terms
    pub builtin_terms: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            allowed_terms: Vec::new(),
            min_confidence: 0.6,
            min_text_length: 4,
            dictionary: BTreeMap::new(),
            dictionary_precedence: DictionaryPrecedence::TargetWins,
            builtin_terms: false,
        }
    }
}

impl ClassifierConfig {
    /// Collect classifier settings from a scan configuration.
    #[must_use]
    pub fn from_scan_config(config: &ScanConfig) -> Self {
        let detection = &config.language_detection;
        Self {
            allowed_terms: config.ocr.allowed_terms.clone(),
            min_confidence: detection.min_confidence,
            min_text_length: detection.min_text_length,
            dictionary: detection.custom_dictionary.clone(),
            dictionary_precedence: detection.dictionary_precedence,
            builtin_terms: detection.builtin_terms,
        }
    }
}

/// Decides, block by block, whether text is in a checked language instead of
/// the target language.
///
/// Classification is a pure function of the block text: the same input always
/// produces the same [`ClassifiedBlock`].
pub struct Classifier {
    target_language: String,
    check_languages: Vec<String>,
    allow_list: AllowList,
    dictionary: Dictionary,
    detector: Arc<dyn LanguageDetector>,
    min_confidence: f32,
    min_text_length: usize,
    precedence: DictionaryPrecedence,
}

impl Classifier {
    /// Create a classifier with the whatlang detector restricted to the target
    /// and checked languages.
    ///
    /// # Errors
    /// Returns error if a language code is unknown or an allowed term is invalid.
    pub fn new(
        target_language: &str,
        check_languages: &[String],
        config: &ClassifierConfig,
    ) -> Result<Self> {
        let mut languages = vec![target_language.to_string()];
        languages.extend(check_languages.iter().cloned());
        let detector = WhatlangDetector::new(&languages)?;
        Self::with_detector(target_language, check_languages, config, Arc::new(detector))
    }

    /// Create a classifier with a specific detector.
    ///
    /// # Errors
    /// Returns error if an allowed term is invalid.
    pub fn with_detector(
        target_language: &str,
        check_languages: &[String],
        config: &ClassifierConfig,
        detector: Arc<dyn LanguageDetector>,
    ) -> Result<Self> {
        let target_language = canonical_code(target_language);
        let check_languages: Vec<String> =
            check_languages.iter().map(|c| canonical_code(c)).collect();

        let mut dictionary = Dictionary::new();
        for (language, terms) in &config.dictionary {
            let language = canonical_code(language);
            for term in terms {
                dictionary.insert(&language, term);
            }
        }
        if config.builtin_terms {
            let added = dictionary.seed_builtin(&target_language);
            tracing::debug!("Seeded {} built-in terms for {}", added, target_language);
        }

        let allow_list = AllowList::new(&config.allowed_terms)?;
        tracing::info!(
            "Classifier ready: target={}, check={:?}, {} allowed terms",
            target_language,
            check_languages,
            allow_list.len()
        );

        Ok(Self {
            target_language,
            check_languages,
            allow_list,
            dictionary,
            detector,
            min_confidence: config.min_confidence,
            min_text_length: config.min_text_length,
            precedence: config.dictionary_precedence,
        })
    }

    /// Build from a scan configuration.
    ///
    /// # Errors
    /// Returns error if a language code is unknown or an allowed term is invalid.
    pub fn from_scan_config(config: &ScanConfig) -> Result<Self> {
        Self::new(
            &config.ocr.target_language,
            &config.language_detection.check_languages,
            &ClassifierConfig::from_scan_config(config),
        )
    }

    /// Target language code.
    #[must_use]
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Checked language codes.
    #[must_use]
    pub fn check_languages(&self) -> &[String] {
        &self.check_languages
    }

    /// Classify one block.
    #[must_use]
    pub fn classify(&self, block: &TextBlock) -> ClassifiedBlock {
        let text = block
            .raw_text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = text.to_lowercase();

        let classified = self.classify_normalized(text, &normalized);
        if classified.is_flagged() {
            tracing::debug!(
                "Flagged '{}' as {:?} ({:?}, {:.2})",
                classified.text,
                classified.detected_language,
                classified.rule,
                classified.classification_confidence
            );
        }
        classified
    }

    /// Classify a batch of blocks, preserving order.
    #[must_use]
    pub fn classify_all(&self, blocks: &[TextBlock]) -> Vec<ClassifiedBlock> {
        blocks.iter().map(|b| self.classify(b)).collect()
    }

    fn classify_normalized(&self, text: String, normalized: &str) -> ClassifiedBlock {
        if self.allow_list.matches(normalized) {
            return verdict(text, None, 1.0, Verdict::Suppressed, ClassificationRule::AllowList);
        }

        if normalized.chars().count() < self.min_text_length {
            return verdict(text, None, 0.0, Verdict::Clean, ClassificationRule::TooShort);
        }

        let checked_hit = self
            .check_languages
            .iter()
            .find(|lang| self.dictionary.contains(lang, normalized));
        let target_hit = self.dictionary.contains(&self.target_language, normalized);

        let dictionary_verdict = match (self.precedence, target_hit, checked_hit) {
            (DictionaryPrecedence::TargetWins, true, _) | (_, true, None) => {
                Some(self.target_clean(text.clone()))
            }
            (_, _, Some(lang)) => Some(verdict(
                text.clone(),
                Some(lang.clone()),
                1.0,
                Verdict::Flagged,
                ClassificationRule::CheckedDictionary,
            )),
            (_, false, None) => None,
        };
        if let Some(classified) = dictionary_verdict {
            return classified;
        }

        match self.detector.detect(normalized) {
            Some(detection) => {
                let language = canonical_code(&detection.language);
                let flagged = self.check_languages.contains(&language)
                    && detection.confidence >= self.min_confidence;
                verdict(
                    text,
                    Some(language),
                    detection.confidence,
                    if flagged { Verdict::Flagged } else { Verdict::Clean },
                    ClassificationRule::Detector,
                )
            }
            None => verdict(text, None, 0.0, Verdict::Clean, ClassificationRule::Detector),
        }
    }

    fn target_clean(&self, text: String) -> ClassifiedBlock {
        verdict(
            text,
            Some(self.target_language.clone()),
            1.0,
            Verdict::Clean,
            ClassificationRule::TargetDictionary,
        )
    }
}

fn verdict(
    text: String,
    detected_language: Option<String>,
    classification_confidence: f32,
    verdict: Verdict,
    rule: ClassificationRule,
) -> ClassifiedBlock {
    ClassifiedBlock {
        text,
        detected_language,
        classification_confidence,
        verdict,
        rule,
    }
}
