//! String utilities for the domain layer.
//!
//! The conference and synthesis passes compare short clinical phrases written
//! by different specialists, so they share one normalisation.

use std::collections::BTreeSet;

/// Words that never carry topic information on their own.
const STOPWORDS: &[&str] = &[
    "about", "after", "also", "and", "any", "are", "been", "before", "being", "but", "can",
    "could", "does", "for", "from", "had", "has", "have", "into", "its", "may", "might", "more",
    "most", "not", "other", "over", "patient", "should", "some", "such", "than", "that", "the",
    "their", "then", "there", "these", "they", "this", "those", "very", "was", "were", "what",
    "when", "which", "while", "will", "with", "would", "your",
];

/// Normalise a finding phrase for comparison.
///
/// Lowercases, replaces punctuation with spaces and collapses whitespace, so
/// "Sleep disturbance." and "sleep  disturbance" compare equal.
pub fn normalize_phrase(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the topic-bearing terms of a phrase (length >= 4, not a stopword).
pub fn significant_terms(s: &str) -> BTreeSet<String> {
    normalize_phrase(s)
        .split(' ')
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Whether two phrases share at least one significant term.
pub fn shares_terms(a: &str, b: &str) -> bool {
    let a = significant_terms(a);
    significant_terms(b).iter().any(|t| a.contains(t))
}

/// Whether `keyword` occurs in `text` as a whole word (case-insensitive).
pub fn contains_word(text: &str, keyword: &str) -> bool {
    let keyword = normalize_phrase(keyword);
    if keyword.is_empty() {
        return false;
    }
    let text = format!(" {} ", normalize_phrase(text));
    text.contains(&format!(" {} ", keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("Sleep  Disturbance."), "sleep disturbance");
        assert_eq!(normalize_phrase("  L4-L5 disc "), "l4 l5 disc");
        assert_eq!(normalize_phrase("!!!"), "");
    }

    #[test]
    fn test_significant_terms_drop_stopwords_and_short_words() {
        let terms = significant_terms("Should the patient start graded exercise for the back?");
        assert!(terms.contains("graded"));
        assert!(terms.contains("exercise"));
        assert!(terms.contains("back"));
        assert!(terms.contains("start"));
        assert!(!terms.contains("should"));
        assert!(!terms.contains("patient"));
        assert!(!terms.contains("for"));
    }

    #[test]
    fn test_shares_terms() {
        assert!(shares_terms("Is sleep quality affecting pain?", "Poor sleep quality"));
        assert!(!shares_terms("Any cardiac history?", "Poor sleep quality"));
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("Severe LOW back pain, immediate review", "immediate"));
        assert!(contains_word("low back pain", "back pain"));
        assert!(!contains_word("backpack", "back"));
        assert!(!contains_word("anything", ""));
    }
}
