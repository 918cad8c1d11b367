//! # API Request/Response Types
//!
//! JSON structures of the HTTP API that are not catalog records, and the
//! mapping from [`CatalogError`] to an HTTP response.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use gamedex_core::CatalogError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Message of every 500 reply. Internal detail goes to the log only.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected server error occurred. Please try again later.";

/// Message of every 429 reply.
pub const RATE_LIMITED_MESSAGE: &str =
    "Request limit exceeded (429 Too Many Requests). Try again shortly.";

/// Message of every 401 reply.
pub const UNAUTHORIZED_MESSAGE: &str = "Missing or invalid API key.";

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Record counts of a catalog, as printed by `gamedex status --json-mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub games: usize,
    pub genres: usize,
    pub developers: usize,
    pub persistent: bool,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

/// Render a `{status, message}` reply.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        status: status.as_u16(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

/// A catalog error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_unexpected() {
            tracing::error!(error = %self.0, "unexpected error");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_MESSAGE);
        }
        error_response(status, self.0.to_string())
    }
}

// =============================================================================
// JSON BODY
// =============================================================================

/// A JSON request body whose rejection is answered as a 400 error body.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(CatalogError::Invalid(rejection.body_text())))?;
        Ok(Self(value))
    }
}

// =============================================================================
// PATH AND QUERY
// =============================================================================

/// A numeric record id from the path. A non-numeric or negative segment is
/// answered as a 400 error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub u64);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError(CatalogError::Invalid(rejection.body_text())))?;
        Ok(Self(id))
    }
}

/// A query string whose rejection is answered as a 400 error body.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError(CatalogError::Invalid(rejection.body_text())))?;
        Ok(Self(value))
    }
}

// =============================================================================
// TESTS
// =============================================================================
