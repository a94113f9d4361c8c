//! Terms that are never reported, even when they look untranslated.

use crate::classifier::normalize_text;
use crate::error::{LangError, Result};
use regex::Regex;

/// Case-insensitive allow-list.
///
/// Text is allowed when it equals a term or contains one as a whole word,
/// so `"OK"` covers both `"ok"` and `"Click OK to continue"`.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    terms: Vec<(String, Regex)>,
}

impl AllowList {
    /// Build an allow-list. Blank terms are skipped.
    ///
    /// # Errors
    /// Returns [`LangError::InvalidTerm`] if a term cannot be compiled.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(terms.len());
        for term in terms {
            let normalized = normalize_text(term.as_ref());
            if normalized.is_empty() {
                continue;
            }
            // Word boundaries expressed as non-word neighbours so terms with
            // punctuation ("check-in", "c++") still match.
            let pattern = format!(r"(?:^|\W){}(?:$|\W)", regex::escape(&normalized));
            let regex = Regex::new(&pattern).map_err(|e| LangError::InvalidTerm {
                term: term.as_ref().to_string(),
                message: e.to_string(),
            })?;
            compiled.push((normalized, regex));
        }
        Ok(Self { terms: compiled })
    }

    /// Whether `text` is covered by a term.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let normalized = normalize_text(text);
        self.terms
            .iter()
            .any(|(term, regex)| *term == normalized || regex.is_match(&normalized))
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether there are no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_whole_word_matches() {
        let allow = AllowList::new(&["OK", "check-in"]).unwrap();

        assert!(allow.matches("OK"));
        assert!(allow.matches("ok"));
        assert!(allow.matches("Click OK to continue"));
        assert!(allow.matches("Heure de check-in"));
        assert!(!allow.matches("Booking"));
        assert!(!allow.matches("Tokens"));
    }

    #[test]
    fn test_special_characters_are_literal() {
        let allow = AllowList::new(&["c++", "(beta)"]).unwrap();
        assert!(allow.matches("Version c++"));
        assert!(allow.matches("Nouveau (beta)"));
        assert!(!allow.matches("cxx"));
    }

    #[test]
    fn test_blank_terms_skipped() {
        let allow = AllowList::new(&["", "  "]).unwrap();
        assert!(allow.is_empty());
        assert!(!allow.matches(""));
    }
}
