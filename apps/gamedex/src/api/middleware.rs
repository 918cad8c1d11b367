//! # Middleware Module
//!
//! Per-version rate limiting and the panic fault handler.
//!
//! ## Configuration
//!
//! - `rate_limit_v1` / `GAMEDEX_RATE_LIMIT_V1`: Requests per second on `/v1` (default: 5)
//! - `rate_limit_v2` / `GAMEDEX_RATE_LIMIT_V2`: Requests per second on `/v2` (default: 20)
//!
//! A limit of 0 leaves the version unlimited. The legacy surface is never
//! limited.

use super::types::{RATE_LIMITED_MESSAGE, UNEXPECTED_MESSAGE, error_response};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::any::Any;
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Limiter shared by every route of one API version.
pub type VersionRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// State of [`rate_limit_middleware`]: the limiter and the version it guards.
#[derive(Clone)]
pub struct RateLimit {
    pub limiter: VersionRateLimiter,
    pub version: &'static str,
}

/// Create a limiter allowing `requests_per_second`, or `None` for 0.
pub fn create_rate_limiter(requests_per_second: u32) -> Option<VersionRateLimiter> {
    let rps = NonZeroU32::new(requests_per_second)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Rate limiting middleware.
///
/// Returns 429 with a JSON error body once the version's quota is spent.
pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limit.limiter.check() {
        Ok(()) => next.run(request).await,
        Err(_) => {
            tracing::warn!(
                event = "rate_limited",
                version = limit.version,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE)
        }
    }
}

// =============================================================================
// FAULT HANDLER
// =============================================================================

/// Answer a panicking handler with the fixed 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(error = detail, "handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_MESSAGE)
}

// =============================================================================
// TESTS
// =============================================================================
