//! # Authentication Module
//!
//! Optional shared-key gate for the labtrack HTTP API.
//!
//! When `LABTRACK_API_KEY` is set at router creation, every route except
//! `/health` requires:
//! ```text
//! Authorization: Bearer <key>
//! ```
//! A bare `<key>` without the `Bearer ` prefix is accepted too.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The key requests must present.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }
}

/// `LABTRACK_API_KEY`, or `None` when unset or empty.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("LABTRACK_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Compare keys in time independent of where they differ.
///
/// Both sides are zero-padded to a common length before `ct_eq`, and the
/// lengths are compared separately.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    let len = provided.len().max(expected.len());
    let mut lhs = vec![0u8; len];
    let mut rhs = vec![0u8; len];
    lhs[..provided.len()].copy_from_slice(provided);
    rhs[..expected.len()].copy_from_slice(expected);

    let bytes_equal: bool = lhs.ct_eq(&rhs).into();
    bytes_equal && provided.len() == expected.len()
}

fn unauthorized(reason: &'static str) -> Response {
    tracing::warn!(event = "auth_failure", reason, "request rejected");
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized")),
    )
        .into_response()
}

/// Reject requests without the configured key.
pub async fn api_key_auth_middleware(
    State(expected): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let Some(value) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return unauthorized("missing_authorization_header");
    };

    let provided = value.strip_prefix("Bearer ").unwrap_or(value);
    if keys_match(provided.as_bytes(), expected.0.as_bytes()) {
        next.run(request).await
    } else {
        unauthorized("invalid_api_key")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_requires_same_length_and_bytes() {
        assert!(keys_match(b"secret", b"secret"));
        assert!(!keys_match(b"secret", b"secreT"));
        assert!(!keys_match(b"secret", b"secret\0"));
        assert!(!keys_match(b"", b"secret"));
    }
}
