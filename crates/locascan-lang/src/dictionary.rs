//! Per-language term dictionary.

use crate::classifier::normalize_text;
use std::collections::{HashMap, HashSet};

/// UI and hospitality terms that read as English to a detector but are in
/// everyday use on French screens.
const BUILTIN_FR: &[&str] = &[
    "code de confirmation",
    "check-in",
    "check-out",
    "client",
    "réservation",
    "suite",
    "standard",
    "confirmation",
    "premium",
    "deluxe",
    "basic",
    "superior",
    "service",
    "reception",
    "wifi",
    "breakfast",
    "all-inclusive",
    "email",
    "login",
    "password",
    "dashboard",
    "menu",
    "status",
    "ok",
    "application",
    "documents",
    "contacts",
    "filters",
    "search",
    "calendar",
    "profile",
    "settings",
    "notifications",
    "booking",
    "guest",
    "room",
    "property",
    "amenities",
    "rating",
    "review",
    "payment",
    "price",
    "tax",
    "total",
    "discount",
    "promotion",
    "cancel",
    "refund",
];

const BUILTIN_EN: &[&str] = &[
    "check-in",
    "check-out",
    "booking",
    "reservation",
    "wifi",
    "suite",
    "standard",
    "confirmation",
    "premium",
    "deluxe",
    "basic",
];

/// Known terms per language, matched against whole normalized text.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, HashSet<String>>,
}

impl Dictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term for a language. Blank terms are ignored.
    pub fn insert(&mut self, language: &str, term: &str) {
        let term = normalize_text(term);
        if term.is_empty() {
            return;
        }
        self.entries
            .entry(language.to_lowercase())
            .or_default()
            .insert(term);
    }

    /// Add the built-in terms for a language, if any exist.
    ///
    /// Returns the number of terms added.
    pub fn seed_builtin(&mut self, language: &str) -> usize {
        let terms = match language.to_lowercase().as_str() {
            "fr" => BUILTIN_FR,
            "en" => BUILTIN_EN,
            _ => return 0,
        };
        for term in terms {
            self.insert(language, term);
        }
        terms.len()
    }

    /// Whether `text` is a known term of `language`.
    #[must_use]
    pub fn contains(&self, language: &str, text: &str) -> bool {
        self.entries
            .get(&language.to_lowercase())
            .is_some_and(|terms| terms.contains(&normalize_text(text)))
    }

    /// Number of terms for a language.
    #[must_use]
    pub fn len(&self, language: &str) -> usize {
        self.entries
            .get(&language.to_lowercase())
            .map_or(0, HashSet::len)
    }

    /// Whether the dictionary has no terms at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_normalized() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("en", "Dashboard");
        dictionary.insert("en", "  Check   availability ");

        assert!(dictionary.contains("en", "dashboard"));
        assert!(dictionary.contains("EN", "DASHBOARD"));
        assert!(dictionary.contains("en", "check availability"));
        assert!(!dictionary.contains("fr", "dashboard"));
        assert!(!dictionary.contains("en", "dash"));
    }

    #[test]
    fn test_blank_terms_ignored() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("en", "   ");
        assert!(dictionary.is_empty());
        assert_eq!(dictionary.len("en"), 0);
    }

    #[test]
    fn test_seed_builtin() {
        let mut dictionary = Dictionary::new();
        assert_eq!(dictionary.seed_builtin("fr"), BUILTIN_FR.len());
        assert!(dictionary.contains("fr", "Check-in"));
        assert!(dictionary.contains("fr", "Code de confirmation"));
        assert_eq!(dictionary.seed_builtin("de"), 0);
    }
}
