//! Scripted backend for engine tests: canned rows, injectable failures and
//! hangs, and a log of every call made.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BackendError, ExactMatch, FuzzyCandidate, SearchBackend};
use crate::identifier::CanonicalIdentifier;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Exact(CanonicalIdentifier),
    Fuzzy { text: String, limit: usize },
}

#[derive(Debug, Clone)]
pub enum Behavior {
    Respond,
    Fail(BackendError),
    /// Never completes; only a timeout or cancellation ends the call
    Hang,
}

pub struct ScriptedBackend {
    exact: HashMap<CanonicalIdentifier, Vec<ExactMatch>>,
    fuzzy: Vec<FuzzyCandidate>,
    exact_behavior: Behavior,
    fuzzy_behavior: Behavior,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            fuzzy: Vec::new(),
            exact_behavior: Behavior::Respond,
            fuzzy_behavior: Behavior::Respond,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_exact(mut self, id: &str, document_id: &str, title: &str) -> Self {
        let id: CanonicalIdentifier = id.parse().expect("scripted identifier must parse");
        self.exact.entry(id).or_default().push(ExactMatch {
            document_id: document_id.to_string(),
            title: title.to_string(),
            created: None,
        });
        self
    }

    pub fn with_fuzzy(mut self, document_id: &str, title: &str, score: f64) -> Self {
        self.fuzzy.push(fuzzy_row(document_id, title, score, &[]));
        self
    }

    pub fn with_fuzzy_identifiers(
        mut self,
        document_id: &str,
        title: &str,
        score: f64,
        identifiers: &[&str],
    ) -> Self {
        self.fuzzy.push(fuzzy_row(document_id, title, score, identifiers));
        self
    }

    pub fn exact_behavior(mut self, behavior: Behavior) -> Self {
        self.exact_behavior = behavior;
        self
    }

    pub fn fuzzy_behavior(mut self, behavior: Behavior) -> Self {
        self.fuzzy_behavior = behavior;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exact_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Exact(_)))
            .count()
    }

    pub fn fuzzy_calls(&self) -> Vec<(String, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fuzzy { text, limit } => Some((text, limit)),
                Call::Exact(_) => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn act(behavior: &Behavior) -> Result<(), BackendError> {
        match behavior {
            Behavior::Respond => Ok(()),
            Behavior::Fail(err) => Err(err.clone()),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

fn fuzzy_row(document_id: &str, title: &str, score: f64, identifiers: &[&str]) -> FuzzyCandidate {
    FuzzyCandidate {
        document_id: document_id.to_string(),
        title: title.to_string(),
        created: None,
        snippet: None,
        score,
        identifiers: identifiers
            .iter()
            .map(|id| id.parse().expect("scripted identifier must parse"))
            .collect(),
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn exact_lookup(&self, id: &CanonicalIdentifier) -> Result<Vec<ExactMatch>, BackendError> {
        self.record(Call::Exact(*id));
        Self::act(&self.exact_behavior).await?;
        Ok(self.exact.get(id).cloned().unwrap_or_default())
    }

    async fn fuzzy_search(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<FuzzyCandidate>, BackendError> {
        self.record(Call::Fuzzy {
            text: text.to_string(),
            limit,
        });
        Self::act(&self.fuzzy_behavior).await?;
        Ok(self.fuzzy.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
