//! Engine and backend configuration
//!
//! Configuration is handed to the engine when it is constructed; nothing is
//! read from global state while a request is being served.

use crate::error::AppError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Limits and timeouts for query handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted raw query, in characters
    pub max_query_length: usize,
    /// Per-call timeout for every backend sub-query
    pub backend_timeout_ms: u64,
    /// Result cap passed to (or applied to) each backend call
    pub per_call_limit: usize,
    /// Largest `limit` a search request may ask for
    pub max_search_limit: usize,
    /// Default number of suggestions
    pub suggestion_limit: usize,
    /// Largest `limit` a suggestion request may ask for
    pub max_suggestion_limit: usize,
    /// Shorter prefixes get no suggestions
    pub min_suggest_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_length: 500,
            backend_timeout_ms: 5_000,
            per_call_limit: 50,
            max_search_limit: 100,
            suggestion_limit: 10,
            max_suggestion_limit: 20,
            min_suggest_length: 2,
        }
    }
}

impl EngineConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Reject settings that would make every request fail or return nothing
    pub fn validate(&self) -> Result<(), AppError> {
        let positive = [
            ("max_query_length", self.max_query_length),
            ("per_call_limit", self.per_call_limit),
            ("max_search_limit", self.max_search_limit),
            ("suggestion_limit", self.suggestion_limit),
            ("max_suggestion_limit", self.max_suggestion_limit),
            ("min_suggest_length", self.min_suggest_length),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(AppError::Config(format!("{} must be greater than zero", name)));
        }
        if self.backend_timeout_ms == 0 {
            return Err(AppError::Config(
                "backend_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.suggestion_limit > self.max_suggestion_limit {
            return Err(AppError::Config(format!(
                "suggestion_limit {} exceeds max_suggestion_limit {}",
                self.suggestion_limit, self.max_suggestion_limit
            )));
        }
        Ok(())
    }
}

/// Where document searches are sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Remote search-helper service
    Http {
        base_url: String,
        #[serde(default)]
        api_token: Option<String>,
    },
    /// Documents loaded from a local JSON fixture
    Memory { fixture: PathBuf },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            base_url: "http://localhost:8000".to_string(),
            api_token: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub backend: BackendConfig,
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;

    Ok(config_dir.join("approval-search").join("config.json"))
}

/// Load configuration from `path`, or from the default location.
///
/// A missing default file yields the defaults; a missing explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path()?, false),
    };

    if !path.exists() {
        if explicit {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(AppConfig::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: AppConfig =
        serde_json::from_str(&data).context("Failed to parse config file")?;

    config.engine.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_query_length, 500);
        assert_eq!(config.backend_timeout(), Duration::from_secs(5));
        assert_eq!(config.per_call_limit, 50);
        assert_eq!(config.suggestion_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"engine": {{"backend_timeout_ms": 250}}, "backend": {{"kind": "memory", "fixture": "docs.json"}}}}"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.engine.backend_timeout(), Duration::from_millis(250));
        assert_eq!(config.engine.max_query_length, 500);
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                fixture: PathBuf::from("docs.json")
            }
        );
    }

    #[test]
    fn test_http_backend_config() {
        let json = r#"{"backend": {"kind": "http", "base_url": "https://search.internal", "api_token": "t0k"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Http {
                base_url: "https://search.internal".to_string(),
                api_token: Some("t0k".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EngineConfig {
            per_call_limit: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let config = EngineConfig {
            suggestion_limit: 30,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
