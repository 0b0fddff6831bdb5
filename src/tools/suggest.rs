//! Suggest tool implementation
//!
//! Implements the `suggest(prefix, limit)` MCP tool

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::SuggestArgs;
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::SearchEngine;

/// Handle suggest tool call
pub async fn handle_suggest(
    engine: &SearchEngine,
    id: Option<Value>,
    args: Value,
    cancel: &CancellationToken,
) -> McpResponse {
    let result = match serde_json::from_value::<SuggestArgs>(args) {
        Ok(args) => execute_suggest(engine, args, cancel).await,
        Err(e) => Err(AppError::InvalidInput(format!("Invalid arguments: {}", e))),
    };

    match result {
        Ok(result) => super::to_response(id, result),
        Err(e) => McpResponse::error(id, e.error_code(), &e.message()),
    }
}

/// Shared implementation for suggest (used by MCP and CLI)
pub async fn execute_suggest(
    engine: &SearchEngine,
    args: SuggestArgs,
    cancel: &CancellationToken,
) -> Result<ToolResult, AppError> {
    debug!("Suggest request: '{}'", args.prefix);

    let suggestions = engine
        .suggest_with_cancel(&args.prefix, args.limit, cancel)
        .await?;

    let text = if suggestions.is_empty() {
        "No suggestions.".to_string()
    } else {
        suggestions
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(ToolResult::from_items(vec![
        ContentItem::text(text).with_metadata(json!({ "suggestions": suggestions }))
    ]))
}
