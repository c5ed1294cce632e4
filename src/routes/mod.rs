use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::services::SessionEngine;

pub mod sessions;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SessionEngine>,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(
            TraceLayer::new_for_http().make_span_with(make_span_with_request_id),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(sessions::start))
        .route("/sessions/:id/answers", post(sessions::answer))
        .route("/sessions/:id/refine", post(sessions::refine))
        .route("/sessions/:id/adjust", post(sessions::adjust))
        .route("/sessions/:id/moment", post(sessions::moment_feedback))
        .route("/sessions/:id", delete(sessions::reset))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
