//! Identifier Grammar Recognizer
//!
//! Scans raw input for approval-mark identifiers ("E-numbers") in any of the
//! accepted notations:
//!
//! - `e13*1234*5678*00` (asterisk)
//! - `e13-1234-5678-00` (hyphen)
//! - `e13 1234 5678 00` (single space)
//! - `e131234567800` (no delimiter)
//!
//! A candidate uses one delimiter style throughout. Mixed styles such as
//! `e13*1234-5678*00` are not recognized at all.

use serde::{Deserialize, Serialize};

/// Delimiters accepted between digit groups
pub const DELIMITERS: [u8; 3] = [b'*', b'-', b' '];

/// Number of digit groups in a delimited identifier (country, base, extension, variant)
pub const GROUP_COUNT: usize = 4;

/// Country code group: 1-3 digits
pub const MAX_COUNTRY_DIGITS: usize = 3;

/// Every other group: 1-6 digits
pub const MAX_GROUP_DIGITS: usize = 6;

/// Total digit count bounds; keeps phone numbers and model codes out
pub const MIN_TOTAL_DIGITS: usize = 7;
pub const MAX_TOTAL_DIGITS: usize = 16;

/// How sure the recognizer is that a span is an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Fully concatenated digits, could be a numeric model code
    Low,
    /// Delimited groups with a consistent delimiter
    High,
}

/// A span of the input that looks like an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCandidate {
    /// Byte offset of the leading `e`
    pub start: usize,
    /// Byte offset one past the last digit
    pub end: usize,
    /// The text exactly as typed
    pub raw_text: String,
    pub confidence: Confidence,
}

impl IdentifierCandidate {
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Scan `text` left to right for identifier candidates.
///
/// Greedy and non-overlapping: once a candidate is accepted, scanning resumes
/// after its end. An empty result is normal, not an error.
pub fn recognize(text: &str) -> Vec<IdentifierCandidate> {
    let bytes = text.as_bytes();
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if is_marker(bytes, i) {
            if let Some((end, confidence)) = scan_identifier(bytes, i) {
                candidates.push(IdentifierCandidate {
                    start: i,
                    end,
                    raw_text: text[i..end].to_string(),
                    confidence,
                });
                i = end;
                continue;
            }
        }
        i += 1;
    }

    candidates
}

/// Digit groups of an identifier that is still being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialIdentifier {
    /// Digit groups as typed; the last one may be incomplete
    pub groups: Vec<String>,
    /// Whether the groups came from a delimited notation
    pub delimited: bool,
    /// A delimiter follows the last group, so it is complete
    pub trailing_delimiter: bool,
}

/// Detect a partial identifier shape covering the whole prefix.
///
/// Accepts `e` followed by up to four digit groups with one consistent
/// delimiter (the last group may be cut short or empty after a trailing
/// delimiter), or `e` followed by a bare digit run.
pub fn recognize_partial(prefix: &str) -> Option<PartialIdentifier> {
    let text = prefix.trim_start();
    let body = text.strip_prefix(['e', 'E'])?;
    if body.is_empty() || !body.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    let delimiter = body.bytes().find(|b| !b.is_ascii_digit());
    let Some(delimiter) = delimiter else {
        // Bare digit run: compact notation
        return Some(PartialIdentifier {
            groups: vec![body.to_string()],
            delimited: false,
            trailing_delimiter: false,
        });
    };

    if !DELIMITERS.contains(&delimiter) {
        return None;
    }

    let parts: Vec<&str> = body.split(delimiter as char).collect();
    let trailing_delimiter = parts.last().is_some_and(|p| p.is_empty());
    let groups: Vec<&str> = if trailing_delimiter {
        parts[..parts.len() - 1].to_vec()
    } else {
        parts
    };

    if groups.is_empty() || groups.len() > GROUP_COUNT {
        return None;
    }
    if trailing_delimiter && groups.len() == GROUP_COUNT {
        return None;
    }

    for (idx, group) in groups.iter().enumerate() {
        let max = if idx == 0 {
            MAX_COUNTRY_DIGITS
        } else {
            MAX_GROUP_DIGITS
        };
        if group.is_empty() || group.len() > max || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    Some(PartialIdentifier {
        groups: groups.into_iter().map(str::to_string).collect(),
        delimited: true,
        trailing_delimiter,
    })
}

fn is_marker(bytes: &[u8], at: usize) -> bool {
    matches!(bytes[at], b'e' | b'E') && (at == 0 || !is_word_byte(bytes[at - 1]))
}

/// Letters, digits and any non-ASCII byte count as part of a word
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || !b.is_ascii()
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// A delimiter at `pos` that is immediately followed by a digit
fn delimiter_at(bytes: &[u8], pos: usize) -> Option<u8> {
    let delim = *bytes.get(pos)?;
    let next = *bytes.get(pos + 1)?;
    (DELIMITERS.contains(&delim) && next.is_ascii_digit()).then_some(delim)
}

/// Nothing that could extend the identifier may follow it
fn ends_cleanly(bytes: &[u8], pos: usize) -> bool {
    match bytes.get(pos) {
        None => true,
        Some(&b) if is_word_byte(b) => false,
        Some(b'*') | Some(b'-') => !bytes.get(pos + 1).is_some_and(|n| n.is_ascii_digit()),
        Some(_) => true,
    }
}

fn scan_identifier(bytes: &[u8], start: usize) -> Option<(usize, Confidence)> {
    let pos = start + 1;
    let first = digit_run(bytes, pos);
    if first == 0 {
        return None;
    }

    if first <= MAX_COUNTRY_DIGITS {
        let delim = delimiter_at(bytes, pos + first)?;
        scan_delimited(bytes, pos + first, first, delim)
    } else {
        scan_compact(bytes, pos + first, first)
    }
}

fn scan_delimited(
    bytes: &[u8],
    mut pos: usize,
    first_len: usize,
    delim: u8,
) -> Option<(usize, Confidence)> {
    let mut total = first_len;

    for _ in 1..GROUP_COUNT {
        if bytes.get(pos) != Some(&delim) {
            return None;
        }
        pos += 1;

        let len = digit_run(bytes, pos);
        if len == 0 || len > MAX_GROUP_DIGITS {
            return None;
        }
        total += len;
        pos += len;
    }

    if !(MIN_TOTAL_DIGITS..=MAX_TOTAL_DIGITS).contains(&total) || !ends_cleanly(bytes, pos) {
        return None;
    }

    Some((pos, Confidence::High))
}

fn scan_compact(bytes: &[u8], end: usize, len: usize) -> Option<(usize, Confidence)> {
    if !(MIN_TOTAL_DIGITS..=MAX_TOTAL_DIGITS).contains(&len) || !ends_cleanly(bytes, end) {
        return None;
    }
    Some((end, Confidence::Low))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        recognize(input).into_iter().map(|c| c.raw_text).collect()
    }

    #[test]
    fn test_all_delimiter_styles() {
        assert_eq!(texts("e13*1234*5678*00"), vec!["e13*1234*5678*00"]);
        assert_eq!(texts("e13-1234-5678-00"), vec!["e13-1234-5678-00"]);
        assert_eq!(texts("e13 1234 5678 00"), vec!["e13 1234 5678 00"]);
        assert_eq!(texts("e131234567800"), vec!["e131234567800"]);
    }

    #[test]
    fn test_confidence_levels() {
        let delimited = recognize("E13*1234*5678*00");
        assert_eq!(delimited[0].confidence, Confidence::High);

        let compact = recognize("e131234567800");
        assert_eq!(compact[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_mixed_delimiters_rejected() {
        assert!(recognize("e13*1234-5678*00").is_empty());
        assert!(recognize("e13 1234-5678 00").is_empty());
        assert!(recognize("e13-1234*5678-00").is_empty());
    }

    #[test]
    fn test_spans_inside_free_text() {
        let input = "BMW e13*1234*5678*00 X5";
        let found = recognize(input);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span(), (4, 20));
        assert_eq!(&input[4..20], "e13*1234*5678*00");
    }

    #[test]
    fn test_multiple_candidates_non_overlapping() {
        let found = texts("This document contains e13*1234*5678*00 and e1*2345*6789*01");
        assert_eq!(found, vec!["e13*1234*5678*00", "e1*2345*6789*01"]);
    }

    #[test]
    fn test_digit_count_bounds() {
        // Too few digits overall
        assert!(recognize("e1*1*1*1").is_empty());
        // Phone-number like run that is too short for compact form
        assert!(recognize("e123456").is_empty());
        // Too many digits in compact form
        assert!(recognize("e12345678901234567").is_empty());
        // Group wider than six digits
        assert!(recognize("e13*1234567*5678*00").is_empty());
        // Country code wider than three digits in delimited form
        assert!(recognize("e1313*1234*5678*00").is_empty());
    }

    #[test]
    fn test_requires_word_boundary() {
        assert!(recognize("type13*1234*5678*00").is_empty());
        assert!(recognize("e13*1234*5678*00abc").is_empty());
        assert_eq!(texts("(e13*1234*5678*00)"), vec!["e13*1234*5678*00"]);
    }

    #[test]
    fn test_extra_group_rejected() {
        assert!(recognize("e13*1234*5678*00*11").is_empty());
        // Space-separated numbers after an identifier are ordinary text
        assert_eq!(texts("e13 1234 5678 00 2020"), vec!["e13 1234 5678 00"]);
    }

    #[test]
    fn test_no_identifier() {
        assert!(recognize("BMW X5").is_empty());
        assert!(recognize("").is_empty());
        assert!(recognize("E-approval number").is_empty());
    }

    #[test]
    fn test_non_ascii_neighbours() {
        assert!(recognize("caféE13*1234*5678*00").is_empty());
        assert_eq!(texts("größe e13*1234*5678*00"), vec!["e13*1234*5678*00"]);
    }

    #[test]
    fn test_partial_shapes() {
        let partial = recognize_partial("e13*12").unwrap();
        assert_eq!(partial.groups, vec!["13", "12"]);
        assert!(partial.delimited);
        assert!(!partial.trailing_delimiter);

        let trailing = recognize_partial("E13-").unwrap();
        assert_eq!(trailing.groups, vec!["13"]);
        assert!(trailing.trailing_delimiter);

        let compact = recognize_partial("e1312").unwrap();
        assert_eq!(compact.groups, vec!["1312"]);
        assert!(!compact.delimited);
    }

    #[test]
    fn test_partial_rejects_free_text() {
        assert!(recognize_partial("bmw").is_none());
        assert!(recognize_partial("ex").is_none());
        assert!(recognize_partial("e").is_none());
        assert!(recognize_partial("e13*12-34").is_none());
        assert!(recognize_partial("e13 bmw").is_none());
        assert!(recognize_partial("e13*1234*5678*00*").is_none());
    }
}
