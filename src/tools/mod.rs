//! MCP tools implementation

pub mod search;
pub mod suggest;

use serde_json::Value;

use crate::mcp::{McpResponse, ToolResult};

fn to_response(id: Option<Value>, result: ToolResult) -> McpResponse {
    match serde_json::to_value(result) {
        Ok(value) => McpResponse::success(id, value),
        Err(e) => McpResponse::error(
            id,
            "internal_error",
            &format!("Failed to serialize tool result: {}", e),
        ),
    }
}
