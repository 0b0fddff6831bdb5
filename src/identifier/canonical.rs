//! Canonicalizer
//!
//! Maps recognized identifier candidates onto a single rendering that does
//! not depend on the delimiter style they were typed in. The canonical form
//! is lowercase `e`, zero-padded groups, `*` between groups:
//! `e13*1234*5678*00`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use super::recognizer::{recognize, IdentifierCandidate, PartialIdentifier, GROUP_COUNT};

/// Separator used by every canonical rendering
pub const CANONICAL_SEPARATOR: char = '*';

/// Width expectations for one digit group
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    pub name: &'static str,
    /// Rendered width; shorter values are left-padded with zeros
    pub width: usize,
    /// Maximum number of significant digits
    pub max_digits: usize,
}

/// Group layout of the current grammar version
pub const GRAMMAR: [GroupSpec; GROUP_COUNT] = [
    GroupSpec { name: "country", width: 2, max_digits: 3 },
    GroupSpec { name: "base", width: 4, max_digits: 6 },
    GroupSpec { name: "extension", width: 4, max_digits: 6 },
    GroupSpec { name: "variant", width: 2, max_digits: 2 },
];

/// Digit count of the concatenated (no delimiter) notation
pub const COMPACT_DIGITS: usize = 12;

/// Why a candidate could not be canonicalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCandidate {
    #[error("expected {} digit groups, found {found}", GROUP_COUNT)]
    GroupCount { found: usize },
    #[error("concatenated identifier has {digits} digits, expected {}", COMPACT_DIGITS)]
    CompactLength { digits: usize },
    #[error("{group} group has {digits} significant digits, at most {max} allowed")]
    GroupTooWide {
        group: &'static str,
        digits: usize,
        max: usize,
    },
    #[error("not a single identifier: {0:?}")]
    NotAnIdentifier(String),
}

/// A normalized approval-mark identifier.
///
/// Equality and ordering follow the numeric group sequence, so every
/// notation of the same identifier compares equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalIdentifier {
    country: u32,
    base: u32,
    extension: u32,
    variant: u32,
}

impl CanonicalIdentifier {
    pub fn country(&self) -> u32 {
        self.country
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn extension(&self) -> u32 {
        self.extension
    }

    pub fn variant(&self) -> u32 {
        self.variant
    }

    pub fn groups(&self) -> [u32; GROUP_COUNT] {
        [self.country, self.base, self.extension, self.variant]
    }

    /// Check whether the canonical rendering starts with `prefix`
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_string().starts_with(&prefix.to_ascii_lowercase())
    }

    fn from_groups(groups: &[&str]) -> Result<Self, MalformedCandidate> {
        if groups.len() != GROUP_COUNT {
            return Err(MalformedCandidate::GroupCount {
                found: groups.len(),
            });
        }

        let mut values = [0u32; GROUP_COUNT];
        for ((value, digits), spec) in values.iter_mut().zip(groups).zip(GRAMMAR.iter()) {
            *value = group_value(digits, spec)?;
        }

        let [country, base, extension, variant] = values;
        Ok(Self {
            country,
            base,
            extension,
            variant,
        })
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e")?;
        for (idx, (value, spec)) in self.groups().iter().zip(GRAMMAR.iter()).enumerate() {
            if idx > 0 {
                write!(f, "{}", CANONICAL_SEPARATOR)?;
            }
            write!(f, "{:0width$}", value, width = spec.width)?;
        }
        Ok(())
    }
}

impl FromStr for CanonicalIdentifier {
    type Err = MalformedCandidate;

    /// Parse a string that holds exactly one identifier in any accepted notation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let candidates = recognize(text);
        match candidates.as_slice() {
            [only] if only.start == 0 && only.end == text.len() => try_canonicalize(&only.raw_text),
            _ => Err(MalformedCandidate::NotAnIdentifier(text.to_string())),
        }
    }
}

impl TryFrom<String> for CanonicalIdentifier {
    type Error = MalformedCandidate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalIdentifier> for String {
    fn from(value: CanonicalIdentifier) -> Self {
        value.to_string()
    }
}

/// Canonicalize a recognized candidate.
///
/// Returns `None` for malformed candidates; they are dropped, never passed on
/// as free text.
pub fn canonicalize(candidate: &IdentifierCandidate) -> Option<CanonicalIdentifier> {
    match try_canonicalize(&candidate.raw_text) {
        Ok(id) => Some(id),
        Err(reason) => {
            trace!(candidate = %candidate.raw_text, %reason, "dropping malformed identifier candidate");
            None
        }
    }
}

/// Canonicalize raw identifier text, reporting why it failed
pub fn try_canonicalize(raw: &str) -> Result<CanonicalIdentifier, MalformedCandidate> {
    let body = raw.strip_prefix(['e', 'E']).unwrap_or(raw);
    let runs: Vec<&str> = body
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();

    match runs.as_slice() {
        [compact] => CanonicalIdentifier::from_groups(&split_compact(compact)?),
        groups => CanonicalIdentifier::from_groups(groups),
    }
}

/// Every distinct identifier in `text`, in order of first appearance
pub fn extract_identifiers(text: &str) -> Vec<CanonicalIdentifier> {
    let mut found: Vec<CanonicalIdentifier> = Vec::new();
    for id in recognize(text).iter().filter_map(canonicalize) {
        if !found.contains(&id) {
            found.push(id);
        }
    }
    found
}

/// Render a partially typed identifier as a prefix of canonical identifiers.
///
/// Complete groups are padded to their canonical width; the group still being
/// typed is kept as is. Returns `None` when a complete group is too wide.
pub fn canonical_prefix(partial: &PartialIdentifier) -> Option<String> {
    let (groups, last_complete): (Vec<&str>, bool) = if partial.delimited {
        (
            partial.groups.iter().map(String::as_str).collect(),
            partial.trailing_delimiter,
        )
    } else {
        split_compact_prefix(partial.groups.first()?)?
    };

    let mut out = String::from("e");
    for (idx, (digits, spec)) in groups.iter().zip(GRAMMAR.iter()).enumerate() {
        if idx > 0 {
            out.push(CANONICAL_SEPARATOR);
        }
        let is_last = idx + 1 == groups.len();
        if is_last && !last_complete {
            out.push_str(digits);
        } else {
            let value = group_value(digits, spec).ok()?;
            out.push_str(&format!("{:0width$}", value, width = spec.width));
        }
    }

    if last_complete && groups.len() < GROUP_COUNT {
        out.push(CANONICAL_SEPARATOR);
    }
    Some(out)
}

/// Every canonical prefix a partially typed identifier may stand for.
///
/// A lone one-digit country group that is still being typed is ambiguous:
/// `e1` may grow into `e13*..` or already be country `e01`. Both readings are
/// returned, the literal one first.
pub fn canonical_prefixes(partial: &PartialIdentifier) -> Vec<String> {
    let Some(literal) = canonical_prefix(partial) else {
        return Vec::new();
    };

    let lone_digit = match partial.groups.as_slice() {
        [only] if only.len() == 1 && !partial.trailing_delimiter => Some(only),
        _ => None,
    };

    match lone_digit {
        Some(digit) => {
            let padded = format!("e0{}{}", digit, CANONICAL_SEPARATOR);
            vec![literal, padded]
        }
        None => vec![literal],
    }
}

fn group_value(digits: &str, spec: &GroupSpec) -> Result<u32, MalformedCandidate> {
    let significant = digits.trim_start_matches('0');
    if significant.len() > spec.max_digits {
        return Err(MalformedCandidate::GroupTooWide {
            group: spec.name,
            digits: significant.len(),
            max: spec.max_digits,
        });
    }
    Ok(significant
        .bytes()
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')))
}

/// Split a concatenated digit run at the canonical group widths
fn split_compact(run: &str) -> Result<Vec<&str>, MalformedCandidate> {
    if run.len() != COMPACT_DIGITS {
        return Err(MalformedCandidate::CompactLength { digits: run.len() });
    }

    let mut groups = Vec::with_capacity(GROUP_COUNT);
    let mut rest = run;
    for spec in &GRAMMAR {
        let (head, tail) = rest.split_at(spec.width);
        groups.push(head);
        rest = tail;
    }
    Ok(groups)
}

/// Split a partially typed digit run; the flag tells whether the last chunk is full
fn split_compact_prefix(run: &str) -> Option<(Vec<&str>, bool)> {
    if run.is_empty() || run.len() > COMPACT_DIGITS {
        return None;
    }

    let mut groups = Vec::new();
    let mut rest = run;
    for spec in &GRAMMAR {
        if rest.is_empty() {
            break;
        }
        let take = spec.width.min(rest.len());
        let (head, tail) = rest.split_at(take);
        groups.push(head);
        rest = tail;
    }

    // A full chunk is only known to be complete once more digits follow it
    Some((groups, false))
}
