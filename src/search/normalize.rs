//! Text normalization shared by the planner, the suggestion generator and
//! the in-memory backend.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]+").expect("NON_WORD pattern is valid"));

/// Default snippet length, in characters
pub const SNIPPET_LENGTH: usize = 200;

const ELLIPSIS: &str = "...";

/// Lowercase, strip accents, turn punctuation into spaces, collapse whitespace.
///
/// `"Škoda   Octavia-RS!"` becomes `"skoda octavia rs"`.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    collapse_whitespace(&NON_WORD.replace_all(&folded, " "))
}

/// True when normalization leaves anything to search for
pub fn has_searchable_text(text: &str) -> bool {
    !normalize_text(text).is_empty()
}

/// Trim and replace every whitespace run with a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Window of at most `max_len` characters around the first case-insensitive
/// occurrence of `query` in `content`. Cut edges are marked with `...`.
pub fn make_snippet(content: &str, query: &str, max_len: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_len {
        return content.to_string();
    }

    let needle: Vec<char> = query.trim().chars().collect();
    let (start, end) = match find_case_insensitive(&chars, &needle) {
        Some(pos) => {
            let before = max_len.saturating_sub(needle.len()) / 2;
            let start = pos.saturating_sub(before);
            let end = (start + max_len).min(chars.len());
            (end.saturating_sub(max_len), end)
        }
        None => (0, max_len),
    };

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[start..end]);
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

fn find_case_insensitive(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|window| {
        window
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    })
}
