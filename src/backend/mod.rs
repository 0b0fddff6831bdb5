//! External search capabilities
//!
//! The engine never touches document storage itself. It talks to a
//! [`SearchBackend`], which offers two capabilities:
//!
//! - `exact_lookup(id)` - documents whose metadata carries the identifier
//! - `fuzzy_search(text, limit)` - trigram/fuzzy text matches, scored in [0, 1]

pub mod fuzzy;
pub mod memory;
pub mod remote;

#[cfg(test)]
pub(crate) mod scripted;

use crate::config::BackendConfig;
use crate::identifier::CanonicalIdentifier;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryBackend;
pub use remote::HttpBackend;

/// A document matched by exact identifier lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactMatch {
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// A document matched by fuzzy text search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyCandidate {
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snippet: Option<String>,
    pub score: f64,
    /// Identifiers stored in the document's own metadata
    #[serde(default)]
    pub identifiers: Vec<CanonicalIdentifier>,
}

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode backend response: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Convert reqwest::Error to BackendError
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// The search capabilities consumed by the engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Documents whose metadata contains exactly this identifier
    async fn exact_lookup(&self, id: &CanonicalIdentifier) -> Result<Vec<ExactMatch>, BackendError>;

    /// Up to `limit` fuzzy matches for `text`, best first
    async fn fuzzy_search(&self, text: &str, limit: usize)
        -> Result<Vec<FuzzyCandidate>, BackendError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Build the backend described by `config`
pub fn from_config(config: &BackendConfig, timeout: Duration) -> Result<Arc<dyn SearchBackend>> {
    match config {
        BackendConfig::Http { base_url, api_token } => Ok(Arc::new(HttpBackend::new(
            base_url,
            api_token.clone(),
            timeout,
        )?)),
        BackendConfig::Memory { fixture } => Ok(Arc::new(MemoryBackend::load(fixture)?)),
    }
}
