//! # gamedex HTTP API Module
//!
//! REST API over the catalog, served with axum.
//!
//! ## Surfaces
//!
//! The same routes are mounted three times:
//! - legacy, unversioned (`/games`, `/genres`, `/developers`): no key, no limit,
//!   `Idempotency-Key` ignored
//! - `/v1/...`: API key, 5 req/s, idempotent creation
//! - `/v2/...`: API key, 20 req/s, idempotent creation, `GET /v2/games` lists
//!   only games rated Free
//!
//! ## Endpoints (per resource)
//!
//! - `GET /{resource}` - List all
//! - `GET /{resource}/search` - Search, sort and paginate
//! - `GET /{resource}/{id}` - Fetch one
//! - `POST /{resource}` - Create
//! - `PUT /{resource}/{id}` - Replace
//! - `DELETE /{resource}/{id}` - Delete (guarded)
//! - `GET /health` - Health check, never gated
//!
//! ## Security Configuration
//!
//! See [`crate::config::ServerConfig`]: `api_key`, `rate_limit_v1`,
//! `rate_limit_v2` and `cors_origins`.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_HEADER, keys_match};
pub use handlers::IDEMPOTENCY_HEADER;
pub use middleware::{RateLimit, VersionRateLimiter, create_rate_limiter};
pub use types::{
    ApiError, ErrorResponse, HealthResponse, RATE_LIMITED_MESSAGE, StatusResponse,
    UNAUTHORIZED_MESSAGE, UNEXPECTED_MESSAGE,
};

use crate::config::ServerConfig;
use axum::{
    Extension, Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{MethodRouter, get},
};
use gamedex_core::{
    Catalog, CatalogError, Developer, Game, Genre, IdempotencyStore, MemoryIdempotencyStore,
    Resource,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<Catalog>>,
    /// Lives as long as the process; never persisted.
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State over `catalog` with a fresh idempotency cache.
    #[must_use]
    pub fn new(catalog: Catalog, config: ServerConfig) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            idempotency: Arc::new(MemoryIdempotencyStore::new()),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// SURFACES
// =============================================================================

/// One mounting of the resource routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Legacy,
    V1,
    V2,
}

impl Surface {
    /// Path prefix of the surface.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Legacy => "",
            Self::V1 => "/v1",
            Self::V2 => "/v2",
        }
    }

    /// Whether creation honors `Idempotency-Key`.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(self, Self::Legacy)
    }

    /// Absolute search URL of `R` on this surface, for next-page links.
    #[must_use]
    pub fn search_url<R: Resource>(self, config: &ServerConfig) -> String {
        format!(
            "{}{}/{}/search",
            config.base_url(),
            self.prefix(),
            R::KIND.path()
        )
    }

    /// Collection path of `R` on this surface, for `Location` headers.
    #[must_use]
    pub fn collection_path<R: Resource>(self) -> String {
        format!("{}/{}", self.prefix(), R::KIND.path())
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `cors_origins`.
///
/// - "*": allows all origins
/// - unset: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (cors_origins = \"*\")");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(IDEMPOTENCY_HEADER),
        ])
        .expose_headers([header::LOCATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// The six routes of one resource kind. `list` serves the collection GET.
fn resource_routes<R: Resource>(list: MethodRouter<AppState>) -> Router<AppState> {
    let collection = format!("/{}", R::KIND.path());
    Router::new()
        .route(&collection, list.post(handlers::create::<R>))
        .route(
            &format!("{}/search", collection),
            get(handlers::search_records::<R>),
        )
        .route(
            &format!("{}/{{id}}", collection),
            get(handlers::get_one::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::remove::<R>),
        )
}

/// Every resource route of one surface.
fn surface_routes(surface: Surface) -> Router<AppState> {
    let list_games = match surface {
        Surface::V2 => get(handlers::list_free_games),
        Surface::Legacy | Surface::V1 => get(handlers::list::<Game>),
    };
    Router::new()
        .merge(resource_routes::<Game>(list_games))
        .merge(resource_routes::<Genre>(get(handlers::list::<Genre>)))
        .merge(resource_routes::<Developer>(get(handlers::list::<Developer>)))
        .layer(Extension(surface))
}

/// Wrap a versioned surface in its rate limiter and the key check.
///
/// The limiter runs first, so rejected keys still spend quota.
fn guard_surface(
    mut router: Router<AppState>,
    version: &'static str,
    api_key: Option<&str>,
    requests_per_second: u32,
) -> Router<AppState> {
    if let Some(key) = api_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            Arc::<str>::from(key),
            auth::api_key_auth_middleware,
        ));
    }
    match create_rate_limiter(requests_per_second) {
        Some(limiter) => {
            tracing::info!(
                "Rate limiting {}: {} requests/second",
                version,
                requests_per_second
            );
            router.layer(axum_middleware::from_fn_with_state(
                RateLimit { limiter, version },
                middleware::rate_limit_middleware,
            ))
        }
        None => {
            tracing::info!("Rate limiting {}: disabled", version);
            router
        }
    }
}

/// Create the axum router with every surface and the middleware stack.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. Fault handler - turns panics into the fixed 500 body
/// 3. CORS - handles preflight requests
/// 4. Rate limiting - per version (versioned surfaces only)
/// 5. Authentication - API key (versioned surfaces only, if configured)
pub fn create_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api_key = config.api_key();
    if api_key.is_some() {
        tracing::info!("API key authentication enabled on /v1 and /v2");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - versioned endpoints are publicly accessible! \
             Set GAMEDEX_API_KEY to enable authentication."
        );
    }

    let v1 = guard_surface(surface_routes(Surface::V1), "v1", api_key, config.rate_limit_v1);
    let v2 = guard_surface(surface_routes(Surface::V2), "v2", api_key, config.rate_limit_v2);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(surface_routes(Surface::Legacy))
        .nest("/v1", v1)
        .nest("/v2", v2)
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(middleware::handle_panic))
                .layer(build_cors_layer(config.cors_origins.as_deref())),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl-C.
pub async fn run_server(config: ServerConfig, catalog: Catalog) -> Result<(), CatalogError> {
    let addr = config.bind_addr();
    let router = create_router(AppState::new(catalog, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CatalogError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("gamedex HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CatalogError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// =============================================================================
// TESTS
// =============================================================================
