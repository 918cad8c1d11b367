//! # Authentication Module
//!
//! API key check for the versioned surfaces (`/v1`, `/v2`).
//!
//! ## Configuration
//!
//! - `api_key` / `GAMEDEX_API_KEY`: If set, every versioned route requires it.
//!   `/health` and the legacy routes are never gated.
//!
//! ## Usage
//!
//! Send the key in either header:
//! ```text
//! X-API-KEY: <your-api-key>
//! Authorization: Bearer <your-api-key>
//! ```

use super::types::{UNAUTHORIZED_MESSAGE, error_response};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// The key a request presents, `X-API-KEY` first.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Constant-time key comparison.
///
/// Both keys are padded to the same length so `ct_eq` always runs over
/// the same number of bytes.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// API key authentication middleware.
///
/// Only layered onto the versioned routers when a key is configured.
pub async fn api_key_auth_middleware(
    State(expected): State<Arc<str>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let failure = match provided_key(request.headers()) {
        Some(key) if keys_match(key, &expected) => None,
        Some(_) => Some("invalid_api_key"),
        None => Some("missing_api_key"),
    };

    match failure {
        None => next.run(request).await,
        Some(reason) => {
            tracing::warn!(
                event = "auth_failure",
                reason,
                path = %request.uri().path(),
                "Authentication failed"
            );
            error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn keys_match_requires_equal_length() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "secret2"));
        assert!(!keys_match("", "secret"));
    }

    #[test]
    fn x_api_key_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(provided_key(&headers), Some("from-header"));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(provided_key(&headers), Some("abc"));
        assert_eq!(provided_key(&HeaderMap::new()), None);
    }
}
