//! # Backend Client
//!
//! Reads lab validation results from the external lab backend.
//!
//! The backend is opaque: it grades each lab layer and reports one status
//! per layer. Requests are plain request/response with no retry and no
//! timeout. A non-2xx answer becomes [`ApiError::Status`] whose message is
//! the response body verbatim.
//!
//! A client allows one request in flight; a call made while another is
//! loading returns [`ApiError::Busy`] instead of queueing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The backend could not be reached or its answer could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// Another request from this client is still loading.
    #[error("A backend request is already in progress")]
    Busy,
}

// =============================================================================
// VALIDATION TYPES
// =============================================================================

/// Grade of one lab layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    Pass,
    NotImplemented,
    Implemented,
    Conceptual,
    Error,
}

impl LayerStatus {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            LayerStatus::Pass => "✓",
            LayerStatus::Implemented => "~",
            LayerStatus::Conceptual => "·",
            LayerStatus::NotImplemented => "✗",
            LayerStatus::Error => "!",
        }
    }
}

/// Backend verdict for one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: u32,
    pub name: String,
    pub status: LayerStatus,
    #[serde(default)]
    pub message: String,
}

/// `GET /api/validate` body: lab number -> per-layer results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub labs: BTreeMap<String, Vec<LayerResult>>,
}

impl ValidationReport {
    /// Number of layers graded `pass` across all labs.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.labs
            .values()
            .flatten()
            .filter(|result| result.status == LayerStatus::Pass)
            .count()
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Clears the in-flight flag when the request finishes or is dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// HTTP client for the lab backend.
#[derive(Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    loading: AtomicBool,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            loading: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True while a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Fetch validation results for every lab.
    pub async fn validate_all(&self) -> Result<ValidationReport, ApiError> {
        self.get_json("/api/validate").await
    }

    /// Whether the backend answers `GET /health` with a 2xx status.
    pub async fn health(&self) -> bool {
        self.get_json::<serde_json::Value>("/health").await.is_ok()
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ApiError::Busy);
        }
        let _loading = LoadingGuard(&self.loading);

        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "backend request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(%url, status = status.as_u16(), "backend returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses_backend_shape() {
        let json = r#"{"labs": {"01": [
            {"layer": 1, "name": "Basic chat", "status": "pass", "message": "ok"},
            {"layer": 2, "name": "Parameters", "status": "not_implemented", "message": ""}
        ], "02": [
            {"layer": 1, "name": "Index", "status": "conceptual"}
        ]}}"#;
        let report: ValidationReport = serde_json::from_str(json).expect("parse");
        assert_eq!(report.labs.len(), 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.labs["02"][0].message, "");
        assert_eq!(report.labs["01"][1].status, LayerStatus::NotImplemented);
    }

    #[test]
    fn status_error_displays_body_text() {
        let err = ApiError::Status {
            status: 503,
            message: "backend warming up".to_string(),
        };
        assert_eq!(err.to_string(), "backend warming up");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let client = BackendClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.validate_all().await,
            Err(ApiError::Network(_))
        ));
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn health_is_false_when_unreachable() {
        let client = BackendClient::new("http://127.0.0.1:9");
        assert!(!client.health().await);
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn second_call_while_loading_is_busy() {
        let client = BackendClient::new("http://127.0.0.1:9");
        client.loading.store(true, Ordering::Release);
        assert!(matches!(client.validate_all().await, Err(ApiError::Busy)));
        assert!(client.is_loading());
    }

    #[tokio::test]
    async fn shared_client_rejects_overlapping_request() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        // Accepts the connection and never answers.
        let silent = tokio::spawn(async move {
            let _socket = listener.accept().await;
            std::future::pending::<()>().await;
        });

        let client = std::sync::Arc::new(BackendClient::new(format!("http://{addr}")));
        let first = tokio::spawn({
            let client = std::sync::Arc::clone(&client);
            async move { client.validate_all().await }
        });
        while !client.is_loading() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(client.validate_all().await, Err(ApiError::Busy)));

        first.abort();
        let _ = first.await;
        assert!(!client.is_loading());
        silent.abort();
    }
}
