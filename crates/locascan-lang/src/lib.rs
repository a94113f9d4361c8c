//! Locascan Lang - decides whether a piece of on-screen text is untranslated.
//!
//! A [`Classifier`] combines an [`AllowList`], per-language [`Dictionary`]
//! entries and a statistical [`LanguageDetector`] into one verdict per text
//! block. Rules apply in a fixed order and the first match wins:
//!
//! 1. allow-listed text is suppressed,
//! 2. text shorter than the minimum length is clean,
//! 3. target-language dictionary hits are clean,
//! 4. checked-language dictionary hits are flagged with confidence 1.0,
//! 5. the detector flags text identified as a checked language with enough
//!    confidence.
//!
//! Rules 3 and 4 swap when the dictionary precedence is `checked_wins`.
//!
//! # Example
//!
//! ```rust
//! use locascan_core::{BoundingRegion, TextBlock, Verdict};
//! use locascan_lang::{Classifier, ClassifierConfig};
//!
//! let mut config = ClassifierConfig::default();
//! config.dictionary.insert("en".to_string(), vec!["dashboard".to_string()]);
//! let classifier = Classifier::new("fr", &["en".to_string()], &config).unwrap();
//!
//! let block = TextBlock::new("Dashboard", BoundingRegion::default(), 0.9);
//! assert_eq!(classifier.classify(&block).verdict, Verdict::Flagged);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod allowlist;
pub mod classifier;
pub mod detector;
pub mod dictionary;
pub mod error;

pub use allowlist::AllowList;
pub use classifier::{normalize_text, Classifier, ClassifierConfig};
pub use detector::{Detection, LanguageDetector, WhatlangDetector};
pub use dictionary::Dictionary;
pub use error::{LangError, Result};
