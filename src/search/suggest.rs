//! Suggestion Generator
//!
//! Turns a short prefix into autocomplete strings. An identifier-shaped
//! prefix yields canonical identifiers; anything else yields document
//! titles containing the prefix.

use std::collections::HashSet;

use crate::backend::FuzzyCandidate;
use crate::identifier::{canonical_prefixes, recognize_partial};

use super::normalize::normalize_text;
use super::ranking::clamp_score;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionShape {
    /// Partial identifier, rendered as canonical prefixes such as `e13*12`;
    /// the first one is what was typed
    Identifier(Vec<String>),
    /// Free-text stem
    Title(String),
}

impl SuggestionShape {
    /// Classify a prefix. A trailing space may close an identifier group
    /// (`e1 ` is country `e01`), so trailing whitespace is only dropped when
    /// the prefix does not read as a space-delimited identifier.
    pub fn of(prefix: &str) -> Self {
        let prefixes = recognize_partial(prefix)
            .or_else(|| recognize_partial(prefix.trim_end()))
            .map(|partial| canonical_prefixes(&partial))
            .unwrap_or_default();

        if prefixes.is_empty() {
            SuggestionShape::Title(prefix.trim().to_string())
        } else {
            SuggestionShape::Identifier(prefixes)
        }
    }

    /// Text to send to the fuzzy search
    pub fn search_text(&self) -> &str {
        match self {
            SuggestionShape::Identifier(prefixes) => prefixes.first().map_or("", String::as_str),
            SuggestionShape::Title(stem) => stem,
        }
    }

    /// Pick up to `limit` completions out of fuzzy search rows
    pub fn completions(&self, rows: Vec<FuzzyCandidate>, limit: usize) -> Vec<String> {
        match self {
            SuggestionShape::Identifier(prefixes) => identifier_completions(prefixes, rows, limit),
            SuggestionShape::Title(stem) => title_completions(stem, rows, limit),
        }
    }
}

fn by_score(mut rows: Vec<FuzzyCandidate>) -> Vec<FuzzyCandidate> {
    // Stable, so rows with equal scores keep the backend's order
    rows.sort_by(|a, b| clamp_score(b.score).total_cmp(&clamp_score(a.score)));
    rows
}

fn identifier_completions(
    prefixes: &[String],
    rows: Vec<FuzzyCandidate>,
    limit: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    by_score(rows)
        .into_iter()
        .flat_map(|row| row.identifiers)
        .filter(|id| prefixes.iter().any(|prefix| id.starts_with(prefix)))
        .filter(|id| seen.insert(*id))
        .take(limit)
        .map(|id| id.to_string())
        .collect()
}

fn title_completions(stem: &str, rows: Vec<FuzzyCandidate>, limit: usize) -> Vec<String> {
    let needle = normalize_text(stem);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();

    by_score(rows)
        .into_iter()
        .map(|row| row.title)
        .filter(|title| normalize_text(title).contains(&needle))
        .filter(|title| seen.insert(title.to_lowercase()))
        .take(limit)
        .collect()
}
