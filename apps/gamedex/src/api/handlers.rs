//! # API Endpoint Handlers
//!
//! One generic handler per operation, instantiated for every record kind.

use super::{
    AppState, Surface,
    types::{ApiError, HealthResponse, Payload, QueryParams, RecordId},
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use gamedex_core::{
    AgeRating, CatalogError, CatalogStore, CreationState, Game, Orchestrator, Page, Reply,
    Resource, SearchParams, SearchRequest, Validate, fetch, search,
};

/// Header carrying the idempotency token.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// READ HANDLERS
// =============================================================================

/// `GET /{resource}`: every record, by ascending id.
pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Vec<R>>, ApiError> {
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.list::<R>()?))
}

/// `GET /v2/games`: only games rated Free.
pub async fn list_free_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let catalog = state.catalog.read().await;
    let mut games = catalog.list::<Game>()?;
    games.retain(|game| game.age_rating == AgeRating::Free);
    Ok(Json(games))
}

/// `GET /{resource}/search`
pub async fn search_records<R: Resource>(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Page<R>>, ApiError> {
    let request = SearchRequest::resolve::<R>(&params);
    let next_base = surface.search_url::<R>(&state.config);

    let catalog = state.catalog.read().await;
    Ok(Json(search::<R, _>(&*catalog, &request, &next_base)?))
}

/// `GET /{resource}/{id}`
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<R>, ApiError> {
    let catalog = state.catalog.read().await;
    Ok(Json(fetch::<R, _>(&*catalog, id)?))
}

// =============================================================================
// WRITE HANDLERS
// =============================================================================

/// `POST /{resource}`
///
/// The reply is sent exactly as the orchestrator rendered it, so replays
/// are byte-identical to the first response.
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    headers: HeaderMap,
    Payload(draft): Payload<R::Draft>,
) -> Result<Response, ApiError> {
    draft.validate()?;

    let token = if surface.is_idempotent() {
        headers
            .get(IDEMPOTENCY_HEADER)
            .and_then(|value| value.to_str().ok())
    } else {
        None
    };
    let location_base = surface.collection_path::<R>();

    let creation = {
        let mut catalog = state.catalog.write().await;
        Orchestrator::new(&mut *catalog, state.idempotency.as_ref()).create::<R>(
            draft,
            token,
            &location_base,
        )?
    };

    if creation.state == CreationState::Rejected {
        tracing::warn!(kind = %R::KIND, outcome = creation.state.label(), "creation handled");
    } else {
        tracing::info!(kind = %R::KIND, outcome = creation.state.label(), "creation handled");
    }
    Ok(reply_response(creation.reply))
}

/// `PUT /{resource}/{id}`
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Payload(draft): Payload<R::Draft>,
) -> Result<Json<R>, ApiError> {
    draft.validate()?;

    let mut catalog = state.catalog.write().await;
    let updated =
        Orchestrator::new(&mut *catalog, state.idempotency.as_ref()).update::<R>(id, draft)?;
    Ok(Json(updated))
}

/// `DELETE /{resource}/{id}`
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<StatusCode, ApiError> {
    let mut catalog = state.catalog.write().await;
    match Orchestrator::new(&mut *catalog, state.idempotency.as_ref()).delete::<R>(id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err @ CatalogError::Conflict(_)) => {
            tracing::warn!(kind = %R::KIND, id, "delete blocked by dependent games");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Turn a rendered reply into an HTTP response.
fn reply_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        reply.body,
    )
        .into_response();

    if let Some(location) = reply
        .location
        .and_then(|location| HeaderValue::from_str(&location).ok())
    {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

// =============================================================================
// TESTS
// =============================================================================
