//! Fuzzy Match Orchestrator
//!
//! Issues the sub-queries of a [`QueryPlan`] against the backend. Every call
//! is bounded by the configured timeout and result cap. A failed sub-query
//! is recorded and the others still run; only when every issued sub-query
//! fails does the request fail.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::normalize::has_searchable_text;
use super::planner::{IdentifierTerm, QueryPlan};
use crate::backend::{BackendError, SearchBackend};
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::identifier::{CanonicalIdentifier, Confidence};

/// Which backend capability produced a hit.
///
/// Variant order is precedence order: exact identifier matches win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Strategy {
    ExactIdentifier,
    FuzzyText,
}

/// One document matched by one sub-query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchHit {
    pub document_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub raw_score: f64,
    pub source_strategy: Strategy,
    pub identifiers_found: BTreeSet<CanonicalIdentifier>,
    /// Recognition confidence of the identifier that matched; None for text hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// A sub-query that did not return data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubQueryFailure {
    pub strategy: Strategy,
    /// Identifier or text the sub-query was issued for
    pub term: String,
    pub reason: String,
}

/// Raw outcome of running a plan, before merging
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub hits: Vec<MatchHit>,
    pub failures: Vec<SubQueryFailure>,
    /// Number of sub-queries sent to the backend
    pub issued: usize,
}

pub struct Orchestrator<'a> {
    backend: &'a dyn SearchBackend,
    config: &'a EngineConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(backend: &'a dyn SearchBackend, config: &'a EngineConfig) -> Self {
        Self { backend, config }
    }

    /// Run every sub-query of `plan`, giving up as soon as `cancel` fires
    pub async fn execute(
        &self,
        plan: &QueryPlan,
        cancel: &CancellationToken,
    ) -> Result<Execution, AppError> {
        let free_text = plan
            .free_text_term
            .as_deref()
            .filter(|text| has_searchable_text(text));

        let work = async {
            let (exact, fuzzy) = tokio::join!(
                self.exact_lookups(&plan.identifier_terms),
                self.fuzzy(free_text)
            );
            let mut execution = Execution::default();
            for outcome in exact.into_iter().chain(fuzzy) {
                execution.issued += 1;
                match outcome {
                    Ok(hits) => execution.hits.extend(hits),
                    Err(failure) => execution.failures.push(failure),
                }
            }
            execution
        };

        let execution = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("search cancelled with backend calls in flight");
                return Err(AppError::Cancelled);
            }
            execution = work => execution,
        };

        if execution.issued > 0 && execution.failures.len() == execution.issued {
            let reasons: Vec<String> = execution
                .failures
                .iter()
                .map(|f| format!("{:?} {}: {}", f.strategy, f.term, f.reason))
                .collect();
            return Err(AppError::SearchBackendUnavailable(reasons.join("; ")));
        }

        Ok(execution)
    }

    async fn exact_lookups(
        &self,
        terms: &[IdentifierTerm],
    ) -> Vec<Result<Vec<MatchHit>, SubQueryFailure>> {
        join_all(terms.iter().map(|term| self.exact_lookup(*term))).await
    }

    async fn exact_lookup(&self, term: IdentifierTerm) -> Result<Vec<MatchHit>, SubQueryFailure> {
        let rows = with_timeout(
            self.config.backend_timeout(),
            self.backend.exact_lookup(&term.identifier),
        )
        .await
        .map_err(|err| failure(Strategy::ExactIdentifier, term.identifier.to_string(), err))?;

        debug!(identifier = %term.identifier, rows = rows.len(), "exact lookup finished");
        Ok(rows
            .into_iter()
            .take(self.config.per_call_limit)
            .map(|row| MatchHit {
                document_id: row.document_id,
                title: row.title,
                created: row.created,
                snippet: None,
                raw_score: 1.0,
                source_strategy: Strategy::ExactIdentifier,
                identifiers_found: BTreeSet::from([term.identifier]),
                confidence: Some(term.confidence),
            })
            .collect())
    }

    /// At most one fuzzy sub-query; nothing is issued without searchable text
    async fn fuzzy(&self, text: Option<&str>) -> Option<Result<Vec<MatchHit>, SubQueryFailure>> {
        let text = text?;
        let limit = self.config.per_call_limit;

        let result = with_timeout(
            self.config.backend_timeout(),
            self.backend.fuzzy_search(text, limit),
        )
        .await
        .map_err(|err| failure(Strategy::FuzzyText, text.to_string(), err))
        .map(|rows| {
            debug!(text, rows = rows.len(), "fuzzy search finished");
            rows.into_iter()
                .take(limit)
                .map(|row| MatchHit {
                    document_id: row.document_id,
                    title: row.title,
                    created: row.created,
                    snippet: row.snippet,
                    raw_score: row.score,
                    source_strategy: Strategy::FuzzyText,
                    identifiers_found: row.identifiers.into_iter().collect(),
                    confidence: None,
                })
                .collect::<Vec<_>>()
        });
        Some(result)
    }
}

/// Await a backend call, turning an expired timeout into [`BackendError::Timeout`]
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(BackendError::Timeout(timeout)))
}

fn failure(strategy: Strategy, term: String, err: BackendError) -> SubQueryFailure {
    warn!(?strategy, %term, error = %err, "sub-query failed");
    SubQueryFailure {
        strategy,
        term,
        reason: err.to_string(),
    }
}
