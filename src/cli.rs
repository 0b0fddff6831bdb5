//! CLI mode implementation
//!
//! Provides the command-line interface; the same argument structs double as
//! MCP tool input schemas.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, BackendConfig};

/// approval-search CLI
#[derive(Parser)]
#[command(name = "approval-search")]
#[command(about = "Search approval documents by model name or E-number", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to <config dir>/approval-search/config.json)
    #[arg(short = 'c', long, global = true, env = "APPROVAL_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search documents by model name, E-number, or both
    Search(SearchArgs),
    /// Autocomplete a model name or partial E-number
    Suggest(SuggestArgs),
    /// Run the MCP server on stdio (the default with no arguments)
    Serve,
}

/// Backend overrides; these take precedence over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Base URL of the search-helper service
    #[arg(long, global = true, env = "APPROVAL_SEARCH_URL")]
    pub backend_url: Option<String>,

    /// API token sent as `Authorization: Token <token>`
    #[arg(long, global = true, env = "APPROVAL_SEARCH_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Serve documents from a local JSON fixture instead of the service
    #[arg(long, global = true, env = "APPROVAL_SEARCH_FIXTURE", conflicts_with = "backend_url")]
    pub fixture: Option<PathBuf>,

    /// Per-call backend timeout in milliseconds
    #[arg(long, global = true, env = "APPROVAL_SEARCH_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,
}

impl BackendArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(fixture) = &self.fixture {
            config.backend = BackendConfig::Memory {
                fixture: fixture.clone(),
            };
        } else if let Some(base_url) = &self.backend_url {
            let api_token = match &config.backend {
                BackendConfig::Http { api_token, .. } => api_token.clone(),
                BackendConfig::Memory { .. } => None,
            };
            config.backend = BackendConfig::Http {
                base_url: base_url.clone(),
                api_token,
            };
        }

        if let (Some(token), BackendConfig::Http { api_token, .. }) =
            (&self.api_token, &mut config.backend)
        {
            *api_token = Some(token.clone());
        }

        if let Some(timeout_ms) = self.timeout_ms {
            config.engine.backend_timeout_ms = timeout_ms;
        }
    }
}

/// Search tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SearchArgs {
    /// Model name, E-number in any notation, or both
    #[arg(short = 'q', long)]
    #[schemars(description = "Model name (\"BMW X5\"), E-number in any notation (\"e13*1234*5678*00\", \"e13-1234-5678-00\", \"e13 1234 5678 00\", \"e131234567800\"), or both")]
    pub query: String,

    /// Maximum number of results (default 20, max 100)
    #[arg(short = 'l', long)]
    #[schemars(description = "Maximum number of results (default 20, max 100)")]
    pub limit: Option<usize>,
}

/// Suggest tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SuggestArgs {
    /// Start of a model name or E-number, at least 2 characters
    #[arg(short = 'p', long)]
    #[schemars(description = "Start of a model name or E-number, at least 2 characters")]
    pub prefix: String,

    /// Maximum number of suggestions (default 10, max 20)
    #[arg(short = 'l', long)]
    #[schemars(description = "Maximum number of suggestions (default 10, max 20)")]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from(["approval-search", "search", "-q", "BMW X5", "-l", "5"]).unwrap();
        match cli.command {
            Some(Commands::Search(args)) => {
                assert_eq!(args.query, "BMW X5");
                assert_eq!(args.limit, Some(5));
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_suggest_args_from_json() {
        let args: SuggestArgs = serde_json::from_str(r#"{"prefix": "e13*12"}"#).unwrap();
        assert_eq!(args.prefix, "e13*12");
        assert_eq!(args.limit, None);
    }

    #[test]
    fn test_fixture_override() {
        let cli = Cli::try_parse_from([
            "approval-search",
            "suggest",
            "-p",
            "bmw",
            "--fixture",
            "docs.json",
            "--timeout-ms",
            "250",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.backend.apply(&mut config);
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                fixture: PathBuf::from("docs.json")
            }
        );
        assert_eq!(config.engine.backend_timeout_ms, 250);
    }

    #[test]
    fn test_url_override_keeps_configured_token() {
        let mut config = AppConfig {
            backend: BackendConfig::Http {
                base_url: "http://localhost:8000".into(),
                api_token: Some("from-file".into()),
            },
            ..AppConfig::default()
        };
        let args = BackendArgs {
            backend_url: Some("https://search.example".into()),
            ..BackendArgs::default()
        };
        args.apply(&mut config);

        assert_eq!(
            config.backend,
            BackendConfig::Http {
                base_url: "https://search.example".into(),
                api_token: Some("from-file".into()),
            }
        );
    }

    #[test]
    fn test_no_arguments_means_serve() {
        let cli = Cli::try_parse_from(["approval-search"]).unwrap();
        assert!(cli.command.is_none());
    }
}
