//! In-memory backend over a JSON fixture of documents.
//!
//! Used for local runs and tests. Scoring mimics a trigram-indexed store:
//! title trigram similarity, a capped subsequence score, and full credit
//! for contained text or a matching identifier prefix.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fuzzy::{trigram_similarity, FuzzyMatcher};
use super::{BackendError, ExactMatch, FuzzyCandidate, SearchBackend};
use crate::identifier::{canonical_prefixes, extract_identifiers, recognize_partial, CanonicalIdentifier};
use crate::search::normalize::{make_snippet, normalize_text, SNIPPET_LENGTH};

/// Matches scoring below this are not returned
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// One document as stored in the fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub identifiers: Vec<CanonicalIdentifier>,
}

struct IndexedDocument {
    doc: StoredDocument,
    normalized_title: String,
    /// Declared identifiers plus those found in title and content
    identifiers: Vec<CanonicalIdentifier>,
}

impl IndexedDocument {
    fn new(doc: StoredDocument) -> Self {
        let mut identifiers = doc.identifiers.clone();
        let found = extract_identifiers(&doc.title)
            .into_iter()
            .chain(doc.content.as_deref().map(extract_identifiers).unwrap_or_default());
        for id in found {
            if !identifiers.contains(&id) {
                identifiers.push(id);
            }
        }

        Self {
            normalized_title: normalize_text(&doc.title),
            doc,
            identifiers,
        }
    }

    fn score(&self, matcher: &mut FuzzyMatcher, normalized_query: &str, id_prefixes: &[String]) -> f64 {
        if self
            .identifiers
            .iter()
            .any(|id| id_prefixes.iter().any(|prefix| id.starts_with(prefix)))
        {
            return 1.0;
        }
        if normalized_query.is_empty() {
            return 0.0;
        }
        if self.normalized_title.contains(normalized_query) {
            return 1.0;
        }

        trigram_similarity(normalized_query, &self.normalized_title)
            .max(matcher.subsequence_score(&self.normalized_title, normalized_query))
    }
}

pub struct MemoryBackend {
    documents: Vec<IndexedDocument>,
    min_similarity: f64,
}

impl MemoryBackend {
    pub fn from_documents(documents: Vec<StoredDocument>) -> Self {
        Self {
            documents: documents.into_iter().map(IndexedDocument::new).collect(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    /// Load a fixture: a JSON array of documents
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document fixture {}", path.display()))?;
        let documents: Vec<StoredDocument> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse document fixture {}", path.display()))?;

        debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self::from_documents(documents))
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn exact_lookup(&self, id: &CanonicalIdentifier) -> Result<Vec<ExactMatch>, BackendError> {
        Ok(self
            .documents
            .iter()
            .filter(|indexed| indexed.identifiers.contains(id))
            .map(|indexed| ExactMatch {
                document_id: indexed.doc.document_id.clone(),
                title: indexed.doc.title.clone(),
                created: indexed.doc.created,
            })
            .collect())
    }

    async fn fuzzy_search(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<FuzzyCandidate>, BackendError> {
        let normalized_query = normalize_text(text);
        let id_prefixes = recognize_partial(text)
            .map(|partial| canonical_prefixes(&partial))
            .unwrap_or_default();

        let mut matcher = FuzzyMatcher::new();
        let mut scored: Vec<(f64, &IndexedDocument)> = self
            .documents
            .iter()
            .map(|indexed| {
                let score = indexed.score(&mut matcher, &normalized_query, &id_prefixes);
                (score, indexed)
            })
            .filter(|(score, _)| *score >= self.min_similarity)
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| a.doc.document_id.cmp(&b.doc.document_id))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, indexed)| FuzzyCandidate {
                document_id: indexed.doc.document_id.clone(),
                title: indexed.doc.title.clone(),
                created: indexed.doc.created,
                snippet: indexed
                    .doc
                    .content
                    .as_deref()
                    .map(|content| make_snippet(content, text, SNIPPET_LENGTH)),
                score,
                identifiers: indexed.identifiers.clone(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
