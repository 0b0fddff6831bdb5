//! Fuzzy text scoring for the in-memory backend
//!
//! Two signals, both in [0, 1]:
//! - trigram similarity in the style of PostgreSQL's pg_trgm
//! - a subsequence score from nucleo-matcher (the Smith-Waterman matcher
//!   used by the Helix editor), normalized against a perfect match

use std::collections::HashSet;

use nucleo_matcher::{Config, Matcher, Utf32String};
use unicode_segmentation::UnicodeSegmentation;

/// Subsequence matches never outrank a contiguous hit
pub const SUBSEQUENCE_SCORE_CAP: f64 = 0.9;

type Trigram = [char; 3];

/// Padded word trigrams of `text`.
///
/// Each word is lowercased and padded with two spaces in front and one
/// behind, so "x5" yields `"  x"`, `" x5"` and `"x5 "`.
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();

    for word in text.unicode_words() {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Shared trigrams over the union of trigrams, 0.0 when either side is empty
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;

    shared as f64 / union as f64
}

/// Subsequence matcher with scores normalized into [0, 1]
pub struct FuzzyMatcher {
    matcher: Matcher,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Raw nucleo score, None when `needle` is not a subsequence of `haystack`
    pub fn fuzzy_match(&mut self, haystack: &str, needle: &str) -> Option<u16> {
        if needle.is_empty() {
            return None;
        }

        let haystack = Utf32String::from(haystack);
        let needle = Utf32String::from(needle);

        self.matcher.fuzzy_match(haystack.slice(..), needle.slice(..))
    }

    /// Score relative to the needle matched against itself, capped at
    /// [`SUBSEQUENCE_SCORE_CAP`]
    pub fn subsequence_score(&mut self, haystack: &str, needle: &str) -> f64 {
        let Some(score) = self.fuzzy_match(haystack, needle) else {
            return 0.0;
        };
        let best = match self.fuzzy_match(needle, needle) {
            Some(best) if best > 0 => best,
            _ => return 0.0,
        };

        (score as f64 / best as f64).min(SUBSEQUENCE_SCORE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigrams_are_padded() {
        let set = trigrams("X5");
        assert_eq!(set.len(), 3);
        assert!(set.contains(&[' ', ' ', 'x']));
        assert!(set.contains(&[' ', 'x', '5']));
        assert!(set.contains(&['x', '5', ' ']));
    }

    #[test]
    fn test_trigrams_ignore_punctuation() {
        assert_eq!(trigrams("bmw, x5!"), trigrams("BMW X5"));
    }

    #[test]
    fn test_identical_text_similarity() {
        assert!((trigram_similarity("BMW X5", "bmw x5") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_typo_still_similar() {
        let score = trigram_similarity("volkswagen golf", "volkswagn golf");
        assert!(score > 0.3, "score was {}", score);
        assert!(score < 1.0);
    }

    #[test]
    fn test_unrelated_text() {
        assert!(trigram_similarity("bmw x5", "renault clio") < 0.1);
        assert_eq!(trigram_similarity("", "renault"), 0.0);
    }

    #[test]
    fn test_subsequence_score_bounds() {
        let mut matcher = FuzzyMatcher::new();
        let score = matcher.subsequence_score("mercedes benz sprinter", "mbs");
        assert!(score > 0.0);
        assert!(score <= SUBSEQUENCE_SCORE_CAP);
    }

    #[test]
    fn test_contiguous_match_hits_cap() {
        let mut matcher = FuzzyMatcher::new();
        assert_eq!(matcher.subsequence_score("audi", "audi"), SUBSEQUENCE_SCORE_CAP);
    }

    #[test]
    fn test_no_subsequence() {
        let mut matcher = FuzzyMatcher::new();
        assert_eq!(matcher.subsequence_score("audi a4", "xyz"), 0.0);
        assert!(matcher.fuzzy_match("audi", "").is_none());
    }
}
