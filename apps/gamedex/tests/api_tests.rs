//! Integration tests for the gamedex HTTP API.
//!
//! Uses axum-test to drive the router without starting a real server.
//! Configuration is passed in directly, so tests never touch the environment.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use gamedex::api::{
    API_KEY_HEADER, AppState, ErrorResponse, HealthResponse, IDEMPOTENCY_HEADER,
    RATE_LIMITED_MESSAGE, create_router,
};
use gamedex::config::ServerConfig;
use gamedex_core::{Catalog, Developer, Game, Genre};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// No key, no rate limits.
fn open_config() -> ServerConfig {
    ServerConfig {
        rate_limit_v1: 0,
        rate_limit_v2: 0,
        ..ServerConfig::default()
    }
}

fn server_with(config: ServerConfig) -> TestServer {
    let state = AppState::new(Catalog::new(), config);
    TestServer::new(create_router(state)).unwrap()
}

fn create_test_server() -> TestServer {
    server_with(open_config())
}

fn idempotency_key(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(IDEMPOTENCY_HEADER),
        token.parse::<HeaderValue>().unwrap(),
    )
}

fn genre(name: &str) -> Value {
    json!({ "name": name, "description": "A genre" })
}

fn game(title: &str, rating: &str, developer_id: Option<u64>, genre_ids: &[u64]) -> Value {
    json!({
        "title": title,
        "description": "An adventure",
        "releaseYear": 2015,
        "ageRating": rating,
        "developerId": developer_id,
        "genreIds": genre_ids,
    })
}

fn developer(name: &str, sheet: Option<Value>) -> Value {
    json!({
        "name": name,
        "foundedOn": "1999-04-12",
        "country": "Sweden",
        "technicalSheet": sheet,
    })
}

// =============================================================================
// HEALTH ENDPOINT
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// CRUD AND RELATIONSHIP GUARD
// =============================================================================

/// Genre 201 -> duplicate 409 -> game 201 -> genre delete 409 ->
/// game delete 204 -> genre delete 204.
#[tokio::test]
async fn test_rpg_walkthrough() {
    let server = create_test_server();

    let created = server.post("/v1/genres").json(&genre("RPG")).await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(
        created.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("/v1/genres/1"))
    );
    let stored: Genre = created.json();
    assert_eq!(stored.name, "RPG");

    let duplicate = server.post("/v1/genres").json(&genre("RPG")).await;
    duplicate.assert_status(StatusCode::CONFLICT);
    let error: ErrorResponse = duplicate.json();
    assert_eq!(error.status, 409);
    assert!(error.message.contains("RPG"));

    server
        .post("/v1/games")
        .json(&game("Skyreach", "NOT_UNDER_16", None, &[1]))
        .await
        .assert_status(StatusCode::CREATED);

    let blocked = server.delete("/v1/genres/1").await;
    blocked.assert_status(StatusCode::CONFLICT);
    let error: ErrorResponse = blocked.json();
    assert!(error.message.contains("1 game(s)"));

    server
        .delete("/v1/games/1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete("/v1/genres/1")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/v1/genres/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_referenced_developer_cannot_be_deleted() {
    let server = create_test_server();

    server
        .post("/developers")
        .json(&developer("Northwind Studio", None))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/games")
        .json(&game("Frostbound", "FREE", Some(1), &[]))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete("/developers/1")
        .await
        .assert_status(StatusCode::CONFLICT);

    let stored: Game = server.get("/games/1").await.json();
    assert_eq!(stored.developer.map(|d| d.0), Some(1));
}

#[tokio::test]
async fn test_unresolved_developer_persists_nothing() {
    let server = create_test_server();

    let response = server
        .post("/games")
        .json(&game("Ghostline", "FREE", Some(77), &[]))
        .await;
    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.message.contains("77"));

    let games: Vec<Game> = server.get("/games").await.json();
    assert!(games.is_empty());
}

#[tokio::test]
async fn test_missing_record_is_404() {
    let server = create_test_server();

    let response = server.get("/games/42").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert_eq!(error.status, 404);
    assert_eq!(error.message, "Game with id 42 not found");
}

#[tokio::test]
async fn test_update_replaces_and_drops_sheet() {
    let server = create_test_server();

    let sheet = json!({ "history": "Three founders", "awards": "Best Debut" });
    server
        .post("/v1/developers")
        .json(&developer("Northwind Studio", Some(sheet)))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .put("/v1/developers/1")
        .json(&developer("Northwind Interactive", None))
        .await;
    response.assert_status_ok();
    let updated: Developer = response.json();
    assert_eq!(updated.name, "Northwind Interactive");
    assert!(updated.technical_sheet.is_none());

    server
        .put("/v1/developers/9")
        .json(&developer("Nobody", None))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// FIELD VALIDATION
// =============================================================================

#[tokio::test]
async fn test_field_precheck_rejects_old_release_year() {
    let server = create_test_server();

    let mut body = game("Pong Deluxe", "FREE", None, &[]);
    body["releaseYear"] = json!(1900);
    let response = server.post("/games").json(&body).await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.message.contains("releaseYear"));
}

#[tokio::test]
async fn test_malformed_body_is_json_400() {
    let server = create_test_server();

    let response = server
        .post("/genres")
        .json(&json!({ "description": "no name" }))
        .await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert_eq!(error.status, 400);
}

#[tokio::test]
async fn test_unknown_age_rating_names_valid_ratings() {
    let server = create_test_server();

    let response = server
        .post("/v1/games")
        .json(&game("Skyreach", "PG_13", None, &[]))
        .await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.message.contains("PG_13"));
    assert!(error.message.contains("NOT_UNDER_18"));
}

fn assert_json_400(response: &axum_test::TestResponse) {
    response.assert_status_bad_request();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("application/json"))
    );
    let error: ErrorResponse = response.json();
    assert_eq!(error.status, 400);
    assert!(error.message.starts_with("Invalid input"));
}

#[tokio::test]
async fn test_non_numeric_id_is_json_400() {
    let server = create_test_server();

    let response = server.get("/v1/games/abc").await;
    assert_json_400(&response);
}

#[tokio::test]
async fn test_negative_id_is_json_400() {
    let server = create_test_server();
    server.post("/v1/genres").json(&genre("Puzzle")).await;

    let response = server.delete("/v1/genres/-1").await;
    assert_json_400(&response);

    let genres: Vec<Genre> = server.get("/v1/genres").await.json();
    assert_eq!(genres.len(), 1);
}

#[tokio::test]
async fn test_unparsable_search_page_is_json_400() {
    let server = create_test_server();

    let response = server.get("/v1/games/search?page=abc").await;
    assert_json_400(&response);
}

// =============================================================================
// IDEMPOTENT CREATION
// =============================================================================

#[tokio::test]
async fn test_same_token_replays_first_response() {
    let server = create_test_server();
    let (name, value) = idempotency_key("create-rpg-1");

    let first = server
        .post("/v1/genres")
        .add_header(name.clone(), value.clone())
        .json(&genre("RPG"))
        .await;
    let second = server
        .post("/v1/genres")
        .add_header(name, value)
        .json(&genre("RPG"))
        .await;

    first.assert_status(StatusCode::CREATED);
    second.assert_status(StatusCode::CREATED);
    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(
        first.headers().get(header::LOCATION),
        second.headers().get(header::LOCATION)
    );

    let genres: Vec<Genre> = server.get("/v1/genres").await.json();
    assert_eq!(genres.len(), 1);
}

#[tokio::test]
async fn test_cached_conflict_replays_after_delete() {
    let server = create_test_server();
    let (name, value) = idempotency_key("dup");

    server
        .post("/v2/genres")
        .json(&genre("Puzzle"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/v2/genres")
        .add_header(name.clone(), value.clone())
        .json(&genre("Puzzle"))
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .delete("/v2/genres/1")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .post("/v2/genres")
        .add_header(name, value)
        .json(&genre("Puzzle"))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_legacy_surface_ignores_token() {
    let server = create_test_server();
    let (name, value) = idempotency_key("legacy");

    server
        .post("/genres")
        .add_header(name.clone(), value.clone())
        .json(&genre("Racing"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/genres")
        .add_header(name, value)
        .json(&genre("Racing"))
        .await
        .assert_status(StatusCode::CONFLICT);
}

// =============================================================================
// SURFACE DIFFERENCES
// =============================================================================

#[tokio::test]
async fn test_v2_lists_only_free_games() {
    let server = create_test_server();

    server
        .post("/games")
        .json(&game("Blocks", "FREE", None, &[]))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/games")
        .json(&game("Night Terror", "NOT_UNDER_18", None, &[]))
        .await
        .assert_status(StatusCode::CREATED);

    let v1: Vec<Game> = server.get("/v1/games").await.json();
    let v2: Vec<Game> = server.get("/v2/games").await.json();

    assert_eq!(v1.len(), 2);
    assert_eq!(v2.len(), 1);
    assert_eq!(v2[0].title, "Blocks");
}

// =============================================================================
// SEARCH
// =============================================================================

#[tokio::test]
async fn test_search_paginates_with_next_link() {
    let server = create_test_server();
    let names = [
        "Action",
        "Bullet Hell",
        "City Builder",
        "Dungeon",
        "Exploration",
        "Fighting",
        "Golf",
    ];
    for name in names {
        server
            .post("/genres")
            .json(&genre(name))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let first: Value = server
        .get("/v1/genres/search?size=3&sort=name&direction=DESC")
        .await
        .json();
    assert_eq!(first["total"], 7);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(first["hasMore"], true);
    assert_eq!(first["items"][0]["name"], "Golf");
    assert_eq!(
        first["nextPage"],
        "http://localhost:8080/v1/genres/search?q=&page=1&size=3&sort=name&direction=desc"
    );

    let last: Value = server
        .get("/v1/genres/search?size=3&sort=name&direction=desc&page=2")
        .await
        .json();
    assert_eq!(last["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(last["hasMore"], false);
    assert_eq!(last["nextPage"], "");
}

#[tokio::test]
async fn test_search_numeric_query_matches_year() {
    let server = create_test_server();

    let mut old = game("Retro Run", "FREE", None, &[]);
    old["releaseYear"] = json!(1998);
    server.post("/games").json(&old).await.assert_status(StatusCode::CREATED);
    server
        .post("/games")
        .json(&game("Neo 1998", "FREE", None, &[]))
        .await
        .assert_status(StatusCode::CREATED);

    let page: Value = server.get("/games/search?q=1998").await.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Retro Run");
}

#[tokio::test]
async fn test_search_padded_year_matches_title() {
    let server = create_test_server();

    let mut odyssey = game("Ten 2001 Odyssey", "FREE", None, &[]);
    odyssey["releaseYear"] = json!(1999);
    server.post("/games").json(&odyssey).await.assert_status(StatusCode::CREATED);
    let mut dated = game("Plain Title", "FREE", None, &[]);
    dated["releaseYear"] = json!(2001);
    server.post("/games").json(&dated).await.assert_status(StatusCode::CREATED);

    let page: Value = server.get("/games/search?q=%202001").await.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Ten 2001 Odyssey");
}

#[tokio::test]
async fn test_search_developers_by_country() {
    let server = create_test_server();

    server
        .post("/v1/developers")
        .json(&developer("Northwind Studio", None))
        .await
        .assert_status(StatusCode::CREATED);
    let mut abroad = developer("Lumen Works", None);
    abroad["country"] = json!("Portugal");
    server
        .post("/v1/developers")
        .json(&abroad)
        .await
        .assert_status(StatusCode::CREATED);

    let by_country: Value = server.get("/v1/developers/search?q=swed").await.json();
    assert_eq!(by_country["total"], 1);
    assert_eq!(by_country["items"][0]["name"], "Northwind Studio");

    let by_name: Value = server.get("/v1/developers/search?q=LUMEN").await.json();
    assert_eq!(by_name["total"], 1);
    assert_eq!(by_name["items"][0]["country"], "Portugal");
}

#[tokio::test]
async fn test_search_uses_public_base_url() {
    let server = server_with(ServerConfig {
        public_base_url: "https://games.example.com/".to_string(),
        ..open_config()
    });
    for name in ["Bullet Hell", "Golf", "Action"] {
        server.post("/genres").json(&genre(name)).await;
    }

    let page: Value = server.get("/genres/search?size=1&q=l").await.json();
    let next = page["nextPage"].as_str().unwrap();
    assert!(next.starts_with("https://games.example.com/genres/search?q=l&page=1"));
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

fn keyed_server() -> TestServer {
    server_with(ServerConfig {
        api_key: Some("s3cret".to_string()),
        ..open_config()
    })
}

#[tokio::test]
async fn test_versioned_paths_require_key() {
    let server = keyed_server();

    let response = server.get("/v1/games").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = response.json();
    assert_eq!(error.status, 401);
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let server = keyed_server();

    server
        .get("/v2/games")
        .add_header(
            HeaderName::from_static(API_KEY_HEADER),
            "guess".parse::<HeaderValue>().unwrap(),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_key_accepted_in_either_header() {
    let server = keyed_server();

    server
        .get("/v1/games")
        .add_header(
            HeaderName::from_static(API_KEY_HEADER),
            "s3cret".parse::<HeaderValue>().unwrap(),
        )
        .await
        .assert_status_ok();
    server
        .get("/v2/genres")
        .add_header(
            header::AUTHORIZATION,
            "Bearer s3cret".parse::<HeaderValue>().unwrap(),
        )
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_health_and_legacy_never_gated() {
    let server = keyed_server();

    server.get("/health").await.assert_status_ok();
    server.get("/games").await.assert_status_ok();
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_is_per_version() {
    let server = server_with(ServerConfig {
        rate_limit_v1: 2,
        rate_limit_v2: 50,
        ..ServerConfig::default()
    });

    server.get("/v1/games").await.assert_status_ok();
    server.get("/v1/games").await.assert_status_ok();
    let limited = server.get("/v1/games").await;

    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let error: ErrorResponse = limited.json();
    assert_eq!(error.status, 429);
    assert_eq!(error.message, RATE_LIMITED_MESSAGE);

    server.get("/v2/games").await.assert_status_ok();
    server.get("/games").await.assert_status_ok();
}
