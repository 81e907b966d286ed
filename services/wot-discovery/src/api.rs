//! JSON API over the shared state and the discovery service

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::watch;

use crate::discovery::Discovery;
use crate::model::DiscoveryProgress;
use crate::registry::ThingStore;
use crate::state::StateHandle;
use crate::transform::transform;
use crate::validator;

/// API application state
#[derive(Clone)]
pub struct ApiState {
    pub state: StateHandle,
    pub discovery: Arc<Discovery>,
    pub progress: Arc<watch::Sender<Option<DiscoveryProgress>>>,
}

impl ApiState {
    pub fn new(state: StateHandle, discovery: Arc<Discovery>) -> Self {
        Self {
            state,
            discovery,
            progress: Arc::new(watch::Sender::new(None)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Build the API router
pub fn build_router(api: ApiState) -> Router {
    Router::new()
        .route("/api/things", get(things_handler))
        .route("/api/things/{id}/import", post(import_handler))
        .route("/api/discovered", get(discovered_handler))
        .route("/api/endpoints", get(endpoints_handler))
        .route("/api/progress", get(progress_handler))
        .route("/api/discover", post(discover_handler))
        .route("/api/discover/cancel", post(cancel_handler))
        .route("/api/validate", post(validate_handler))
        .route("/health", get(health_handler))
        .with_state(api)
}

async fn things_handler(State(api): State<ApiState>) -> impl IntoResponse {
    let state = api.state.read().await;
    Json(state.things.clone())
}

async fn discovered_handler(State(api): State<ApiState>) -> impl IntoResponse {
    let state = api.state.read().await;
    Json(state.discovered.clone())
}

async fn endpoints_handler(State(api): State<ApiState>) -> impl IntoResponse {
    let state = api.state.read().await;
    Json(state.endpoints.clone())
}

async fn progress_handler(State(api): State<ApiState>) -> impl IntoResponse {
    let progress = api.progress.borrow().clone();
    Json(progress)
}

async fn discover_handler(
    State(api): State<ApiState>,
    Json(request): Json<DiscoverRequest>,
) -> Response {
    let urls = if request.urls.is_empty() {
        api.discovery.config().base_urls.clone()
    } else {
        request.urls
    };
    if urls.is_empty() {
        return (StatusCode::BAD_REQUEST, "no URLs to scan").into_response();
    }

    let progress = Arc::clone(&api.progress);
    let outcome = api
        .discovery
        .discover_with_progress(&urls, |p| {
            progress.send_replace(Some(p.clone()));
        })
        .await;

    match outcome {
        Ok(outcome) => {
            api.state
                .set_discovered_things(outcome.result().discovered.clone())
                .await;
            Json(outcome).into_response()
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

async fn cancel_handler(State(api): State<ApiState>) -> impl IntoResponse {
    api.discovery.cancel();
    StatusCode::ACCEPTED
}

async fn validate_handler(body: String) -> impl IntoResponse {
    Json(validator::validate(&body))
}

async fn import_handler(State(api): State<ApiState>, Path(id): Path<String>) -> Response {
    let Some(discovered) = api.state.discovered_thing(&id).await else {
        return (StatusCode::NOT_FOUND, format!("no discovered thing '{}'", id)).into_response();
    };
    let thing = transform(&discovered);
    api.state.import_thing(thing.clone()).await;
    Json(thing).into_response()
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
