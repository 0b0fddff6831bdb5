//! Query normalization and fuzzy search orchestration
//!
//! raw query -> recognizer -> canonicalizer -> planner -> orchestrator -> merger.
//! Suggestions share recognition but skip ranking.

pub mod engine;
pub mod normalize;
pub mod orchestrator;
pub mod planner;
pub mod query;
pub mod ranking;
pub mod suggest;


pub use engine::SearchEngine;
pub use orchestrator::{MatchHit, Strategy, SubQueryFailure};
pub use planner::{QueryKind, QueryPlan};
pub use query::RawQuery;
pub use ranking::SearchResponse;
