//! HTTP client utilities
//!
//! Provides a reqwest::Client configured for talking to the search backend

use crate::backend::BackendError;
use reqwest::Client;
use std::time::Duration;

/// Build a reqwest Client with the given request timeout.
///
/// Proxy settings from HTTP_PROXY / HTTPS_PROXY / NO_PROXY are honored by
/// reqwest itself.
pub fn client_with_timeout(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("approval-search/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))
}
