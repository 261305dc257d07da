// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API for the community directory.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/health` | GET | liveness and uptime |
//! | `/groups` | GET | [`GroupsSnapshot`](crate::domain::snapshot::GroupsSnapshot) |
//! | `/groups/refresh` | GET | hierarchy with live room occupancy |
//! | `/api/v1/communities/membership` | POST | `202 Accepted` once queued |
//! | `/api/v1/communities/search` | POST | `{"communities": [...]}` |
//! | `/api/v1/events` | GET | server-sent `DirectoryEvent` stream |
//!
//! Membership requests carry the sender in the [`SENDER_HEADER`] header; the
//! body never names who is joining.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde_json::json;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::coordinator::DirectoryError;
use crate::application::directory_service::DirectoryService;
use crate::application::request_adapter::{MembershipRequest, SearchRequest};
use crate::domain::community::AgentJid;

pub const SENDER_HEADER: &str = "x-aegis-agent-jid";

pub struct AppState {
    pub service: Arc<dyn DirectoryService>,
    pub start_time: Instant,
}

/// Build the router. `cors` enables a permissive CORS layer for dashboards
/// served from another origin.
pub fn app(service: Arc<dyn DirectoryService>, cors: bool) -> Router {
    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let router = Router::new()
        .route("/health", get(health))
        .route("/groups", get(groups))
        .route("/groups/refresh", get(refresh_groups))
        .route("/api/v1/communities/membership", post(submit_membership))
        .route("/api/v1/communities/search", post(search_communities))
        .route("/api/v1/events", get(stream_events))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub enum ApiError {
    MissingSender,
    InvalidBody(String),
    Directory(DirectoryError),
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError::Directory(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingSender => (
                StatusCode::BAD_REQUEST,
                format!("Missing {} header", SENDER_HEADER),
            ),
            ApiError::InvalidBody(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Directory(DirectoryError::Request(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Directory(e @ DirectoryError::QueueClosed) => {
                error!("Membership rejected: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            ApiError::Directory(e @ DirectoryError::Roster(_)) => {
                warn!("Occupancy refresh failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.groups().await)
}

async fn refresh_groups(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.refresh_groups().await?))
}

async fn submit_membership(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let sender = headers
        .get(SENDER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(AgentJid::new)
        .ok_or(ApiError::MissingSender)?;

    state.service.submit_membership(request, sender).await?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

async fn search_communities(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.service.search(request).await?))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.service.subscribe()).filter_map(|received| match received {
        Ok(event) => match Event::default().event(event.event_type()).json_data(&event) {
            Ok(sse) => Some(Ok::<_, Infallible>(sse)),
            Err(e) => {
                warn!("Failed to encode directory event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Event stream subscriber lagged by {} events", skipped);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
