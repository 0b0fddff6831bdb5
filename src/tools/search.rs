//! Search tool implementation
//!
//! Implements the `search(query, limit)` MCP tool

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::SearchArgs;
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::{SearchEngine, SearchResponse, Strategy};

/// Results returned when the caller gives no limit
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Handle search tool call
pub async fn handle_search(
    engine: &SearchEngine,
    id: Option<Value>,
    args: Value,
    cancel: &CancellationToken,
) -> McpResponse {
    match handle_search_impl(engine, args, cancel).await {
        Ok(result) => super::to_response(id, result),
        Err(e) => McpResponse::error(id, e.error_code(), &e.message()),
    }
}

async fn handle_search_impl(
    engine: &SearchEngine,
    args: Value,
    cancel: &CancellationToken,
) -> Result<ToolResult, AppError> {
    let search_args: SearchArgs = serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))?;

    execute_search(engine, search_args, cancel).await
}

/// Shared implementation for search (used by MCP and CLI)
pub async fn execute_search(
    engine: &SearchEngine,
    args: SearchArgs,
    cancel: &CancellationToken,
) -> Result<ToolResult, AppError> {
    debug!("Search request: '{}'", args.query);

    let limit = args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let response = engine.search_with_cancel(&args.query, limit, cancel).await?;

    let metadata = serde_json::to_value(&response)
        .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;

    Ok(ToolResult::from_items(vec![ContentItem::text(
        format_search_results(&response),
    )
    .with_metadata(metadata)]))
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::ExactIdentifier => "exact identifier",
        Strategy::FuzzyText => "text match",
    }
}

/// Format a search response as markdown
pub fn format_search_results(response: &SearchResponse) -> String {
    let mut markdown = format!("# Search results for \"{}\"\n\n", response.query_echo.as_str().trim());

    if !response.identifiers_recognized.is_empty() {
        let ids: Vec<String> = response
            .identifiers_recognized
            .iter()
            .map(|id| format!("`{}`", id))
            .collect();
        markdown.push_str(&format!("Recognized identifiers: {}\n\n", ids.join(", ")));
    }

    for failure in &response.failures {
        markdown.push_str(&format!(
            "**Warning:** {} search for `{}` failed ({}); results may be incomplete.\n\n",
            strategy_label(failure.strategy),
            failure.term,
            failure.reason
        ));
    }

    if response.results.is_empty() {
        markdown.push_str("No matching documents found.\n");
        return markdown;
    }

    for (idx, hit) in response.results.iter().enumerate() {
        markdown.push_str(&format!(
            "{}. **{}** (document {})\n",
            idx + 1,
            hit.title,
            hit.document_id
        ));
        markdown.push_str(&format!(
            "   score {:.2}, {}",
            hit.raw_score,
            strategy_label(hit.source_strategy)
        ));
        if let Some(created) = hit.created {
            markdown.push_str(&format!(", created {}", created.format("%Y-%m-%d")));
        }
        markdown.push('\n');

        if !hit.identifiers_found.is_empty() {
            let ids: Vec<String> = hit.identifiers_found.iter().map(|id| id.to_string()).collect();
            markdown.push_str(&format!("   identifiers: {}\n", ids.join(", ")));
        }
        if let Some(snippet) = &hit.snippet {
            markdown.push_str(&format!("   > {}\n", snippet.replace('\n', " ")));
        }
        markdown.push('\n');
    }

    markdown
}
