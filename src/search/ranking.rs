//! Result Merger/Ranker
//!
//! Folds the hits of every sub-query into one deduplicated, deterministically
//! ordered result list.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::orchestrator::{MatchHit, Strategy, SubQueryFailure};
use super::planner::{QueryKind, QueryPlan};
use super::query::RawQuery;
use crate::identifier::CanonicalIdentifier;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<MatchHit>,
    pub identifiers_recognized: BTreeSet<CanonicalIdentifier>,
    pub query_echo: RawQuery,
    /// None when the query was blank and nothing was planned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_kind: Option<QueryKind>,
    /// Sub-queries that failed while others succeeded
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SubQueryFailure>,
}

impl SearchResponse {
    /// Response for a query with nothing to search for
    pub fn empty(query: RawQuery) -> Self {
        Self {
            results: Vec::new(),
            identifiers_recognized: BTreeSet::new(),
            query_echo: query,
            query_kind: None,
            failures: Vec::new(),
        }
    }

    /// Some sub-query failed, so results may be incomplete
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Scores outside [0, 1] are clamped; NaN counts as no confidence at all
pub fn clamp_score(score: f64) -> f64 {
    // `<=` also folds -0.0 into 0.0, which total_cmp would otherwise rank lower
    if score.is_nan() || score <= 0.0 {
        0.0
    } else {
        score.min(1.0)
    }
}

/// Ranking order: score descending, exact identifier before fuzzy text,
/// High confidence before Low before none.
pub fn rank_order(a: &MatchHit, b: &MatchHit) -> Ordering {
    b.raw_score
        .total_cmp(&a.raw_score)
        .then_with(|| a.source_strategy.cmp(&b.source_strategy))
        .then_with(|| b.confidence.cmp(&a.confidence))
}

/// Which of two hits for the same document to keep. Remaining fields break
/// ties so the choice never depends on input order.
fn keep_order(a: &MatchHit, b: &MatchHit) -> Ordering {
    rank_order(a, b)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.snippet.cmp(&b.snippet))
        .then_with(|| a.created.cmp(&b.created))
}

/// Merge sub-query hits into a response.
///
/// Each document appears once, carrying its best hit; identifiers found by
/// every hit for that document are unioned onto it. `identifiersRecognized`
/// holds the plan's identifier terms plus identifiers confirmed by exact
/// lookups.
///
/// Results sort by score, then strategy, then recognition confidence (High
/// before Low), then document id.
pub fn merge(
    query: RawQuery,
    plan: &QueryPlan,
    hits: Vec<MatchHit>,
    failures: Vec<SubQueryFailure>,
) -> SearchResponse {
    let mut identifiers_recognized: BTreeSet<CanonicalIdentifier> =
        plan.identifier_terms.iter().map(|t| t.identifier).collect();

    let mut by_document: BTreeMap<String, (MatchHit, BTreeSet<CanonicalIdentifier>)> =
        BTreeMap::new();

    for mut hit in hits {
        hit.raw_score = clamp_score(hit.raw_score);
        if hit.source_strategy == Strategy::ExactIdentifier {
            identifiers_recognized.extend(hit.identifiers_found.iter().copied());
        }

        match by_document.get_mut(&hit.document_id) {
            Some((best, found)) => {
                found.extend(hit.identifiers_found.iter().copied());
                if keep_order(&hit, best) == Ordering::Less {
                    *best = hit;
                }
            }
            None => {
                let found = hit.identifiers_found.clone();
                by_document.insert(hit.document_id.clone(), (hit, found));
            }
        }
    }

    let mut results: Vec<MatchHit> = by_document
        .into_values()
        .map(|(mut hit, found)| {
            hit.identifiers_found = found;
            hit
        })
        .collect();

    results.sort_by(|a, b| rank_order(a, b).then_with(|| a.document_id.cmp(&b.document_id)));

    SearchResponse {
        results,
        identifiers_recognized,
        query_echo: query,
        query_kind: Some(plan.kind),
        failures,
    }
}
