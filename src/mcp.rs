//! MCP (Model Context Protocol) handling module
//!
//! This module implements the JSON-RPC 2.0 protocol for MCP communication.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::search::SearchEngine;

/// MCP JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version field - required by the protocol but not accessed in code
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Initialize request parameters
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: Option<String>,
    #[allow(dead_code)]
    pub version: Option<String>,
}

/// MCP JSON-RPC 2.0 response structure
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP Error structure
#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: String,
    pub message: String,
}

/// MCP Tool call arguments
#[derive(Debug, Deserialize)]
pub struct ToolCallArgs {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// MCP Content item
#[derive(Debug, Serialize)]
pub struct ContentItem {
    pub r#type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// MCP Tool result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
}

impl McpResponse {
    /// Create a successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: &str, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

impl ToolResult {
    /// Create a result from explicit content items
    pub fn from_items(content: Vec<ContentItem>) -> Self {
        Self { content }
    }

    /// Markdown text of the first content item
    pub fn into_text(self) -> String {
        self.content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default()
    }
}

impl ContentItem {
    /// Helper to create plain text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            r#type: "text".to_string(),
            text: content.into(),
            metadata: None,
        }
    }

    /// Attach structured data alongside the text
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Parse MCP request from JSON string
pub fn parse_request(json: &str) -> Result<McpRequest> {
    let request: McpRequest = serde_json::from_str(json)?;
    Ok(request)
}

/// Serialize MCP response to JSON string
pub fn serialize_response(response: &McpResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

/// Handle stdio MCP communication until stdin closes or `shutdown` fires
pub async fn handle_stdio(engine: SearchEngine, shutdown: CancellationToken) -> Result<()> {
    info!("Starting approval-search MCP server on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = AsyncBufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, stopping MCP server");
                break;
            }
            line = reader.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        if line.trim().is_empty() {
            continue;
        }
        debug!("Received request: {}", line);

        let response = match parse_request(&line) {
            Ok(request) => handle_request(&engine, request, &shutdown).await,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                Some(McpResponse::error(
                    None,
                    "parse_error",
                    &format!("Invalid JSON: {}", e),
                ))
            }
        };

        let Some(response) = response else {
            continue;
        };

        let response_json = serialize_response(&response)?;
        debug!("Sending response: {}", response_json);

        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Handle a single MCP request; notifications get no response
async fn handle_request(
    engine: &SearchEngine,
    request: McpRequest,
    shutdown: &CancellationToken,
) -> Option<McpResponse> {
    if request.id.is_none() && request.method.starts_with("notifications/") {
        debug!("Ignoring notification {}", request.method);
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(request),
        "tools/call" => handle_tool_call(engine, request, shutdown).await,
        "tools/list" => handle_tools_list(request),
        _ => McpResponse::error(
            request.id,
            "method_not_found",
            &format!("Method '{}' not found", request.method),
        ),
    };
    Some(response)
}

/// Handle tools/call method
async fn handle_tool_call(
    engine: &SearchEngine,
    request: McpRequest,
    shutdown: &CancellationToken,
) -> McpResponse {
    let args: ToolCallArgs = match serde_json::from_value(request.params.unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            return McpResponse::error(
                request.id.clone(),
                "invalid_params",
                &format!("Invalid parameters: {}", e),
            )
        }
    };

    // Each call gets its own token so a shutdown cancels in-flight work
    let cancel = shutdown.child_token();

    match args.name.as_str() {
        "search" => {
            crate::tools::search::handle_search(engine, request.id, args.arguments, &cancel).await
        }
        "suggest" => {
            crate::tools::suggest::handle_suggest(engine, request.id, args.arguments, &cancel)
                .await
        }
        _ => McpResponse::error(
            request.id,
            "tool_not_found",
            &format!("Tool '{}' not found", args.name),
        ),
    }
}

/// Handle tools/list method
fn handle_tools_list(request: McpRequest) -> McpResponse {
    let tools = build_tools_array();

    McpResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle initialize method
fn handle_initialize(request: McpRequest) -> McpResponse {
    if let Some(params) = request.params {
        if let Ok(init_params) = serde_json::from_value::<InitializeParams>(params) {
            let client = init_params
                .client_info
                .and_then(|info| info.name)
                .unwrap_or_else(|| "Unknown Client".to_string());
            info!("Client connected: {}", client);
        }
    }

    let tools = build_tools_array();
    let result = serde_json::json!({
        "serverInfo": {
            "name": "approval-search",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "list": true, "call": true }
        },
        "tools": tools
    });
    McpResponse::success(request.id, result)
}

/// Build the tools array returned from tools/list and initialize
pub(crate) fn build_tools_array() -> serde_json::Value {
    use crate::cli::{SearchArgs, SuggestArgs};
    use schemars::schema_for;

    // Generate JSON schemas from the CLI argument structs
    let search_schema = schema_for!(SearchArgs);
    let suggest_schema = schema_for!(SuggestArgs);

    serde_json::json!([
        {
            "name": "search",
            "description": "Search approval documents by model name, E-number in any notation, or both. Exact E-number matches rank first.",
            "inputSchema": search_schema
        },
        {
            "name": "suggest",
            "description": "Autocomplete a partially typed model name or E-number",
            "inputSchema": suggest_schema
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::config::EngineConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn engine() -> SearchEngine {
        SearchEngine::new(
            Arc::new(ScriptedBackend::new().with_fuzzy("1", "BMW X5", 0.8)),
            EngineConfig::default(),
        )
    }

    fn request(id: Option<Value>, method: &str, params: Option<Value>) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }

    async fn respond(req: McpRequest) -> Option<McpResponse> {
        handle_request(&engine(), req, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_initialize_response_contains_fields() {
        let resp = respond(request(Some(json!(1)), "initialize", None))
            .await
            .expect("response");
        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        assert_eq!(
            result
                .get("serverInfo")
                .and_then(|v| v.get("name"))
                .and_then(|v| v.as_str()),
            Some("approval-search")
        );
        assert_eq!(
            result
                .get("capabilities")
                .and_then(|v| v.get("tools"))
                .and_then(|v| v.get("list"))
                .and_then(|v| v.as_bool()),
            Some(true)
        );
        assert!(result.get("tools").and_then(|v| v.as_array()).is_some());
    }

    #[tokio::test]
    async fn test_tools_list_contains_search_and_suggest() {
        let resp = respond(request(Some(json!(2)), "tools/list", None))
            .await
            .expect("response");
        let result = resp.result.expect("result present");
        let names: Vec<String> = result["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()).map(String::from))
            .collect();
        assert_eq!(names, vec!["search".to_string(), "suggest".to_string()]);
    }

    #[tokio::test]
    async fn test_tool_call_search() {
        let resp = respond(request(
            Some(json!(3)),
            "tools/call",
            Some(json!({"name": "search", "arguments": {"query": "bmw x5"}})),
        ))
        .await
        .expect("response");
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("**BMW X5** (document 1)"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let resp = respond(request(
            Some(json!(4)),
            "tools/call",
            Some(json!({"name": "profile", "arguments": {}})),
        ))
        .await
        .expect("response");
        assert_eq!(resp.error.unwrap().code, "tool_not_found");

        let resp = respond(request(Some(json!(5)), "resources/list", None))
            .await
            .expect("response");
        assert_eq!(resp.error.unwrap().code, "method_not_found");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let resp = respond(request(None, "notifications/initialized", None)).await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_query_too_long_error_code() {
        let query = "x".repeat(501);
        let resp = respond(request(
            Some(json!(6)),
            "tools/call",
            Some(json!({"name": "search", "arguments": {"query": query}})),
        ))
        .await
        .expect("response");
        assert_eq!(resp.error.unwrap().code, "query_too_long");
    }
}
