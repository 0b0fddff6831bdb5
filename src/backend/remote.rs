//! HTTP client for the remote search-helper service.
//!
//! Endpoints (both return JSON arrays):
//! - `GET {base}/api/search/exact?id=<canonical identifier>`
//! - `GET {base}/api/search/fuzzy?q=<text>&limit=<n>`

use super::{BackendError, ExactMatch, FuzzyCandidate, SearchBackend};
use crate::identifier::CanonicalIdentifier;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            BackendError::Unavailable(format!("Invalid backend URL '{}': {}", base_url, e))
        })?;

        // Url::join replaces the last path segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: crate::http::client_with_timeout(timeout)?,
            base_url,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Unavailable(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!("Backend request: GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.api_token {
            request = request.header(AUTHORIZATION, format!("Token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn exact_lookup(&self, id: &CanonicalIdentifier) -> Result<Vec<ExactMatch>, BackendError> {
        let mut url = self.endpoint("api/search/exact")?;
        url.query_pairs_mut().append_pair("id", &id.to_string());
        self.get_json(url).await
    }

    async fn fuzzy_search(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<FuzzyCandidate>, BackendError> {
        let mut url = self.endpoint("api/search/fuzzy")?;
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request head
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_exact_lookup_request_shape() {
        let (base, server) =
            serve_once("200 OK", r#"[{"documentId": "12", "title": "BMW X5"}]"#).await;
        let backend =
            HttpBackend::new(&base, Some("secret".to_string()), Duration::from_secs(5)).unwrap();

        let id: CanonicalIdentifier = "e13-1234-5678-00".parse().unwrap();
        let rows = backend.exact_lookup(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].document_id, "12");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/search/exact?id=e13*1234*5678*00 "));
        assert!(request.to_lowercase().contains("authorization: token secret"));
    }

    #[tokio::test]
    async fn test_fuzzy_search_request_shape() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"documentId": "3", "title": "BMW X5 xDrive", "score": 0.7}]"#,
        )
        .await;
        let backend = HttpBackend::new(&format!("{}/svc", base), None, Duration::from_secs(5)).unwrap();

        let rows = backend.fuzzy_search("BMW X5", 25).await.unwrap();
        assert_eq!(rows[0].title, "BMW X5 xDrive");
        assert!(rows[0].identifiers.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /svc/api/search/fuzzy?q=BMW+X5&limit=25 "));
        assert!(!request.to_lowercase().contains("authorization"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base, server) = serve_once("503 Service Unavailable", r#"{"detail": "down"}"#).await;
        let backend = HttpBackend::new(&base, None, Duration::from_secs(5)).unwrap();

        let err = backend.fuzzy_search("audi", 5).await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 503, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (base, server) = serve_once("200 OK", r#"{"not": "an array"}"#).await;
        let backend = HttpBackend::new(&base, None, Duration::from_secs(5)).unwrap();

        let err = backend.fuzzy_search("audi", 5).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        server.await.unwrap();
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpBackend::new("not a url", None, Duration::from_secs(1)),
            Err(BackendError::Unavailable(_))
        ));
    }
}
