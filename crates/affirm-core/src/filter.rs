//! Content filter
//!
//! Decides whether a candidate line is short enough and free of
//! denylisted terms. The denylist comes from configuration.

use crate::config::AffirmConfig;

/// Stateless line filter
#[derive(Debug, Clone)]
pub struct ContentFilter {
    max_chars: usize,

    /// Denylisted terms, already lowercased
    denylist: Vec<String>,
}

impl ContentFilter {
    /// Create a filter with an explicit length bound and denylist
    pub fn new<I, S>(max_chars: usize, denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = denylist
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();

        Self { max_chars, denylist }
    }

    /// Create a filter from the service configuration
    pub fn from_config(config: &AffirmConfig) -> Self {
        Self::new(config.max_line_length, &config.denylist_terms)
    }

    /// Whether `text` is fit to serve
    pub fn is_acceptable(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if text.chars().count() > self.max_chars {
            return false;
        }

        let lowered = text.to_lowercase();
        !self.denylist.iter().any(|term| lowered.contains(term.as_str()))
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::from_config(&AffirmConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank() {
        let filter = ContentFilter::default();
        assert!(!filter.is_acceptable(""));
        assert!(!filter.is_acceptable("   \n\t "));
    }

    #[test]
    fn test_length_bound() {
        let filter = ContentFilter::default();
        assert!(filter.is_acceptable(&"a".repeat(250)));
        assert!(!filter.is_acceptable(&"a".repeat(251)));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let filter = ContentFilter::new(3, Vec::<String>::new());
        assert!(filter.is_acceptable("héé"));
        assert!(!filter.is_acceptable("héé!"));
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let filter = ContentFilter::default();
        assert!(!filter.is_acceptable("Let's talk POLITICS"));
        assert!(!filter.is_acceptable("trigger warning"));
        assert!(!filter.is_acceptable("not a SuIcIdE joke"));
        assert!(filter.is_acceptable("I told my wife she was drawing her eyebrows too high."));
    }

    #[test]
    fn test_denylist_extendable() {
        let filter = ContentFilter::new(250, ["Pineapple", "  ", "crypto"]);
        assert!(!filter.is_acceptable("pineapple belongs on pizza"));
        assert!(!filter.is_acceptable("buy CRYPTO now"));
        assert!(filter.is_acceptable("a perfectly normal sentence"));
    }
}
