//! HTTP route handlers for the StagePass server.
//!
//! This module provides the HTTP API endpoints:
//!
//! - `POST /auth/login` - Exchange credentials for a bearer token
//! - `/events` - Event CRUD plus event-scoped resource routes
//! - `/artists` - Artist CRUD
//! - `/resources` - Resource CRUD
//! - `GET /health` - Health check endpoint
//!
//! # Architecture
//!
//! All routes share application state through [`AppState`], which contains:
//! - Configuration (including the token signing secret and delete policy)
//! - The SQLite connection pool used by the repositories
//! - The credential store consulted at login
//! - Server start time for uptime reporting
//!
//! Every route except `POST /auth/login` and `GET /health` sits behind
//! [`auth_middleware`], which rejects requests without a valid bearer token
//! before the handler runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagepass_server::config::Config;
//! use stagepass_server::db::create_pool;
//! use stagepass_server::routes::{create_router, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let pool = create_pool(&config.database_url)
//!         .await
//!         .expect("failed to open database");
//!     let state = AppState::new(config, pool);
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::auth::{auth_middleware, issue_token};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Artist, ArtistWithEvent, CreateArtist, CreateEvent, CreateEventResource, CreateResource,
    Event, EventWithRelations, Resource, ResourceWithEvent, UpdateArtist, UpdateEvent,
    UpdateResource,
};
use crate::repositories::{
    ArtistRepository, EventDeleteOutcome, EventRepository, ResourceRepository,
};
use crate::users::{CredentialStore, FixedCredentials};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
///
/// Cloned for each request handler; the contained pool and `Arc`s make the
/// clone cheap.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// SQLite connection pool shared by the repositories.
    pub pool: SqlitePool,

    /// Read-only credential store consulted at login.
    pub credentials: Arc<dyn CredentialStore>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state from configuration and an open pool.
    ///
    /// The credential store is seeded from the configured user list.
    #[must_use]
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let credentials = Arc::new(FixedCredentials::from_pairs(&config.users));

        Self {
            config: Arc::new(config),
            pool,
            credentials,
            start_time: Instant::now(),
        }
    }

    /// Creates application state with a custom credential store.
    ///
    /// Useful for testing or for substituting a persisted backend.
    #[must_use]
    pub fn with_credentials(
        config: Config,
        pool: SqlitePool,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pool,
            credentials,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The config and credential store hold plaintext secrets.
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("pool", &self.pool)
            .field("credentials", &"<CredentialStore>")
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
///
/// # Routes
///
/// Open:
/// - `POST /auth/login` - Token issuance
/// - `GET /health` - Health check
///
/// Guarded by [`auth_middleware`]:
/// - `GET|POST /events`, `GET|PUT|DELETE /events/{id}`
/// - `GET|POST /events/{id}/resources`,
///   `DELETE /events/{id}/resources/{resource_id}`
/// - `GET|POST /artists`, `GET|PUT|DELETE /artists/{id}`
/// - `GET|POST /resources`, `GET|PUT|DELETE /resources/{id}`
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/{id}/resources",
            get(list_event_resources).post(create_event_resource),
        )
        .route(
            "/events/{id}/resources/{resource_id}",
            delete(delete_event_resource),
        )
        .route("/artists", get(list_artists).post(create_artist))
        .route(
            "/artists/{id}",
            get(get_artist).put(update_artist).delete(delete_artist),
        )
        .route("/resources", get(list_resources).post(create_resource))
        .route(
            "/resources/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/auth/login", post(post_login))
        .route("/health", get(get_health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// POST /auth/login - Token Issuance
// ============================================================================

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed token to present as `Authorization: Bearer <token>`.
    pub jwt_token: String,
}

/// POST /auth/login - Exchange fixed credentials for a signed token.
///
/// The response does not distinguish an unknown username from a wrong
/// password.
///
/// # Responses
///
/// - `200 OK` - `{"jwt_token": "..."}`
/// - `401 Unauthorized` - Credentials did not match
async fn post_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let Some(user) = state.credentials.verify(&body.username, &body.password) else {
        debug!(username = %body.username, "Login rejected");
        return Err(ApiError::unauthorized("invalid credentials"));
    };

    let token = issue_token(user, &state.config.jwt_secret)
        .map_err(|err| ApiError::internal(err.to_string()))?;

    info!(username = %user.username, "Login succeeded");

    Ok(Json(LoginResponse { jwt_token: token }))
}

// ============================================================================
// /events - Event CRUD
// ============================================================================

/// GET /events - Lists every event with its artists and resources.
async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventWithRelations>>> {
    let events = EventRepository::list(&state.pool).await?;
    Ok(Json(events))
}

/// GET /events/{id} - Fetches one event with its artists and resources.
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<EventWithRelations>> {
    let event = EventRepository::get(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("event {id} not found")))?;

    Ok(Json(event))
}

/// POST /events - Creates an event and returns the stored row.
async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = EventRepository::create(&state.pool, body).await?;

    info!(event_id = event.id, name = %event.name, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /events/{id} - Applies a partial update and returns the stored row.
async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateEvent>,
) -> ApiResult<Json<Event>> {
    let event = EventRepository::update(&state.pool, id, body)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("event {id} not found")))?;

    Ok(Json(event))
}

/// DELETE /events/{id} - Deletes an event under the configured policy.
///
/// # Responses
///
/// - `204 No Content` - Event removed (with its dependents under `cascade`)
/// - `404 Not Found` - No event with that id
/// - `409 Conflict` - `restrict` policy and dependents still exist
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    match EventRepository::delete(&state.pool, id, state.config.delete_policy).await? {
        EventDeleteOutcome::Deleted => {
            info!(event_id = id, "Event deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        EventDeleteOutcome::NotFound => {
            Err(ApiError::not_found(format!("event {id} not found")))
        }
        EventDeleteOutcome::HasDependents => Err(ApiError::conflict(format!(
            "event {id} still has artists or resources"
        ))),
    }
}

// ============================================================================
// /events/{id}/resources - Event-Scoped Resources
// ============================================================================

/// GET /events/{id}/resources - Lists the resources rented for an event.
///
/// An unknown event id yields an empty list, the same as an event with no
/// resources.
async fn list_event_resources(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Resource>>> {
    let resources = ResourceRepository::list_for_event(&state.pool, id).await?;
    Ok(Json(resources))
}

/// POST /events/{id}/resources - Adds a resource under an event.
///
/// The parent id comes from the path; a nonexistent event fails the
/// foreign-key constraint and returns 409.
async fn create_event_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CreateEventResource>,
) -> ApiResult<(StatusCode, Json<Resource>)> {
    let resource = ResourceRepository::create_for_event(&state.pool, id, body).await?;

    info!(
        event_id = id,
        resource_id = resource.id,
        "Resource added to event"
    );

    Ok((StatusCode::CREATED, Json(resource)))
}

/// DELETE /events/{id}/resources/{resource_id} - Removes an event's resource.
///
/// The delete is scoped to the event: a resource id that exists under a
/// different event returns 404 and leaves the row in place.
async fn delete_event_resource(
    State(state): State<AppState>,
    Path((id, resource_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if ResourceRepository::delete_for_event(&state.pool, id, resource_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!(
            "resource {resource_id} not found for event {id}"
        )))
    }
}

// ============================================================================
// /artists - Artist CRUD
// ============================================================================

/// GET /artists - Lists every artist with its parent event.
async fn list_artists(State(state): State<AppState>) -> ApiResult<Json<Vec<ArtistWithEvent>>> {
    let artists = ArtistRepository::list(&state.pool).await?;
    Ok(Json(artists))
}

/// GET /artists/{id} - Fetches one artist with its parent event.
async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ArtistWithEvent>> {
    let artist = ArtistRepository::get(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("artist {id} not found")))?;

    Ok(Json(artist))
}

/// POST /artists - Creates an artist and returns the stored row.
async fn create_artist(
    State(state): State<AppState>,
    Json(body): Json<CreateArtist>,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let artist = ArtistRepository::create(&state.pool, body).await?;

    info!(artist_id = artist.id, name = %artist.name, "Artist created");

    Ok((StatusCode::CREATED, Json(artist)))
}

/// PUT /artists/{id} - Applies a partial update and returns the stored row.
async fn update_artist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateArtist>,
) -> ApiResult<Json<Artist>> {
    let artist = ArtistRepository::update(&state.pool, id, body)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("artist {id} not found")))?;

    Ok(Json(artist))
}

/// DELETE /artists/{id} - Deletes an artist by id.
async fn delete_artist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if ArtistRepository::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("artist {id} not found")))
    }
}

// ============================================================================
// /resources - Resource CRUD
// ============================================================================

/// GET /resources - Lists every resource with its parent event.
async fn list_resources(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ResourceWithEvent>>> {
    let resources = ResourceRepository::list(&state.pool).await?;
    Ok(Json(resources))
}

/// GET /resources/{id} - Fetches one resource with its parent event.
async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ResourceWithEvent>> {
    let resource = ResourceRepository::get(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("resource {id} not found")))?;

    Ok(Json(resource))
}

/// POST /resources - Creates a resource and returns the stored row.
///
/// Unlike the event-scoped create, `rented` is required here and the parent
/// event comes from the body's `event_id`.
async fn create_resource(
    State(state): State<AppState>,
    Json(body): Json<CreateResource>,
) -> ApiResult<(StatusCode, Json<Resource>)> {
    let resource = ResourceRepository::create(&state.pool, body).await?;

    info!(resource_id = resource.id, name = %resource.name, "Resource created");

    Ok((StatusCode::CREATED, Json(resource)))
}

/// PUT /resources/{id} - Applies a partial update and returns the stored row.
async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateResource>,
) -> ApiResult<Json<Resource>> {
    let resource = ResourceRepository::update(&state.pool, id, body)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("resource {id} not found")))?;

    Ok(Json(resource))
}

/// DELETE /resources/{id} - Deletes a resource by id.
async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if ResourceRepository::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("resource {id} not found")))
    }
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Response body for the health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status (always "ok" if responding).
    pub status: String,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// No authentication required.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed();

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: uptime.as_secs(),
    })
}

// ============================================================================
// Tests
// ============================================================================
