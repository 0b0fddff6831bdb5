//! approval-search library
//!
//! Recognizes approval-mark identifiers (E-numbers) in free-form queries,
//! plans exact and fuzzy sub-queries against a search backend, and merges
//! the results into one ranked list.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod identifier;
pub mod mcp;
pub mod search;
pub mod tools;

#[cfg(test)]
mod tests_mcp_adjustments;

pub use config::{AppConfig, EngineConfig};
pub use error::AppError;
pub use identifier::{CanonicalIdentifier, Confidence};
pub use search::{SearchEngine, SearchResponse};
