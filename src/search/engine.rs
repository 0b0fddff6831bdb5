//! Search Engine Integration
//!
//! Ties together recognition, planning, orchestration and ranking into the
//! two exposed operations, `search` and `suggest`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::orchestrator::{with_timeout, Orchestrator};
use super::planner::{plan, recognize_query};
use super::query::RawQuery;
use super::ranking::{merge, SearchResponse};
use super::suggest::SuggestionShape;
use crate::backend::SearchBackend;
use crate::config::EngineConfig;
use crate::error::{validate_limit, AppError};

/// Stateless request handler; one instance serves any number of concurrent
/// requests.
#[derive(Clone)]
pub struct SearchEngine {
    backend: Arc<dyn SearchBackend>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(backend: Arc<dyn SearchBackend>, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Search documents by model name, identifier, or both
    pub async fn search(&self, raw_query: &str, limit: usize) -> Result<SearchResponse, AppError> {
        self.search_with_cancel(raw_query, limit, &CancellationToken::new())
            .await
    }

    pub async fn search_with_cancel(
        &self,
        raw_query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, AppError> {
        let query = RawQuery::new(raw_query, self.config.max_query_length)?;
        let limit = validate_limit(limit, self.config.max_search_limit)?;

        if query.is_blank() {
            debug!("blank query, nothing to search");
            return Ok(SearchResponse::empty(query));
        }

        let recognition = recognize_query(&query);
        let plan = plan(&query, &recognition);

        let execution = Orchestrator::new(self.backend.as_ref(), &self.config)
            .execute(&plan, cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut response = merge(query, &plan, execution.hits, execution.failures);
        response.results.truncate(limit);

        info!(
            backend = self.backend.name(),
            kind = ?plan.kind,
            results = response.results.len(),
            degraded = response.is_degraded(),
            "search finished"
        );
        Ok(response)
    }

    /// Autocomplete completions for `prefix`; `limit` defaults to the configured
    /// suggestion limit
    pub async fn suggest(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<String>, AppError> {
        self.suggest_with_cancel(prefix, limit, &CancellationToken::new())
            .await
    }

    pub async fn suggest_with_cancel(
        &self,
        prefix: &str,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, AppError> {
        let limit = validate_limit(
            limit.unwrap_or(self.config.suggestion_limit),
            self.config.max_suggestion_limit,
        )?;
        // Trailing whitespace stays: `e1 ` closes the country group
        let prefix = RawQuery::new(prefix.trim_start(), self.config.max_query_length)?;

        if prefix.as_str().trim_end().chars().count() < self.config.min_suggest_length {
            return Ok(Vec::new());
        }

        let shape = SuggestionShape::of(prefix.as_str());
        debug!(?shape, "suggestion shape");

        let call = with_timeout(
            self.config.backend_timeout(),
            self.backend
                .fuzzy_search(shape.search_text(), self.config.per_call_limit),
        );
        let rows = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            rows = call => rows.map_err(|e| AppError::SearchBackendUnavailable(e.to_string()))?,
        };

        let suggestions = shape.completions(rows, limit);
        debug!(count = suggestions.len(), "suggestions ready");
        Ok(suggestions)
    }
}
