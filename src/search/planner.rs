//! Query Planner
//!
//! Decides which backend strategies a query needs: exact identifier lookups,
//! a fuzzy free-text search, or both.

use serde::Serialize;
use tracing::debug;

use super::normalize::collapse_whitespace;
use super::query::RawQuery;
use crate::identifier::{canonicalize, recognize, CanonicalIdentifier, Confidence, IdentifierCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryKind {
    IdentifierOnly,
    FreeTextOnly,
    Mixed,
}

/// A canonical identifier to look up, with the confidence it was recognized at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentifierTerm {
    pub identifier: CanonicalIdentifier,
    pub confidence: Confidence,
}

/// What recognition found in a raw query
#[derive(Debug, Clone, Default)]
pub struct Recognition {
    /// Every candidate span, including ones that failed to canonicalize
    pub candidates: Vec<IdentifierCandidate>,
    /// Distinct canonical identifiers in order of first appearance
    pub terms: Vec<IdentifierTerm>,
}

impl Recognition {
    pub fn identifiers(&self) -> impl Iterator<Item = CanonicalIdentifier> + '_ {
        self.terms.iter().map(|t| t.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub kind: QueryKind,
    pub identifier_terms: Vec<IdentifierTerm>,
    pub free_text_term: Option<String>,
}

/// Run the recognizer and canonicalizer over a query.
///
/// Malformed candidates are dropped. When the same identifier is written
/// twice, the higher confidence wins.
pub fn recognize_query(raw: &RawQuery) -> Recognition {
    let candidates = recognize(raw.as_str());
    let mut terms: Vec<IdentifierTerm> = Vec::new();

    for candidate in &candidates {
        let Some(identifier) = canonicalize(candidate) else {
            continue;
        };
        match terms.iter_mut().find(|t| t.identifier == identifier) {
            Some(existing) => existing.confidence = existing.confidence.max(candidate.confidence),
            None => terms.push(IdentifierTerm {
                identifier,
                confidence: candidate.confidence,
            }),
        }
    }

    Recognition { candidates, terms }
}

/// Build the plan for `raw` from what recognition found
pub fn plan(raw: &RawQuery, recognition: &Recognition) -> QueryPlan {
    if recognition.terms.is_empty() {
        let plan = QueryPlan {
            kind: QueryKind::FreeTextOnly,
            identifier_terms: Vec::new(),
            free_text_term: Some(raw.as_str().trim().to_string()),
        };
        debug!(kind = ?plan.kind, "planned query");
        return plan;
    }

    let remaining = remove_spans(raw.as_str(), &recognition.candidates);
    let plan = if remaining.is_empty() {
        QueryPlan {
            kind: QueryKind::IdentifierOnly,
            identifier_terms: recognition.terms.clone(),
            free_text_term: None,
        }
    } else {
        QueryPlan {
            kind: QueryKind::Mixed,
            identifier_terms: recognition.terms.clone(),
            free_text_term: Some(remaining),
        }
    };

    debug!(
        kind = ?plan.kind,
        identifiers = plan.identifier_terms.len(),
        free_text = ?plan.free_text_term,
        "planned query"
    );
    plan
}

/// Text left after blanking every candidate span, whitespace collapsed
fn remove_spans(text: &str, candidates: &[IdentifierCandidate]) -> String {
    let mut remaining = String::with_capacity(text.len());
    let mut cursor = 0;

    for candidate in candidates {
        remaining.push_str(&text[cursor..candidate.start]);
        remaining.push(' ');
        cursor = candidate.end;
    }
    remaining.push_str(&text[cursor..]);

    collapse_whitespace(&remaining)
}
