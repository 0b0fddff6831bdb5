//! Error types and handling for the approval search engine

use serde::Serialize;
use std::fmt;

/// Errors surfaced to callers of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AppError {
    InvalidInput(String),
    /// Raw input exceeds the configured maximum; rejected before recognition
    QueryTooLong { length: usize, max: usize },
    /// Every issued sub-query failed, so nothing could be returned
    SearchBackendUnavailable(String),
    /// The calling context went away before the response was assembled
    Cancelled,
    Config(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::QueryTooLong { length, max } => write!(
                f,
                "Query too long: {} characters, maximum {} characters",
                length, max
            ),
            AppError::SearchBackendUnavailable(msg) => {
                write!(f, "Search backend unavailable: {}", msg)
            }
            AppError::Cancelled => write!(f, "Request cancelled"),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Get the error code for MCP responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::QueryTooLong { .. } => "query_too_long",
            AppError::SearchBackendUnavailable(_) => "search_backend_unavailable",
            AppError::Cancelled => "cancelled",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Process exit code used in CLI mode
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidInput(_) | AppError::QueryTooLong { .. } => 1,
            AppError::SearchBackendUnavailable(_) => 2,
            AppError::Config(_) => 3,
            AppError::Cancelled => 4,
            AppError::Internal(_) => 5,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert serde_json::Error to AppError
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Check a requested result limit against the configured ceiling
pub fn validate_limit(limit: usize, max: usize) -> Result<usize, AppError> {
    if limit == 0 {
        return Err(AppError::InvalidInput(
            "Limit must be at least 1".to_string(),
        ));
    }

    if limit > max {
        return Err(AppError::InvalidInput(format!(
            "Limit too large, maximum {}",
            max
        )));
    }

    Ok(limit)
}
