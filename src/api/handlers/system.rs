//! System endpoints: health check, rule table.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::Rule;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    active_watches: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of live watches.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_watches: state.watch_service.registry().len().await,
        }),
    )
}

/// `GET /config/rules`: Active rule table.
#[utoipa::path(
    get,
    path = "/config/rules",
    tag = "System",
    summary = "List trigger rules",
    description = "Returns the rule table in evaluation order; the first matching rule wins.",
    responses(
        (status = 200, description = "Rule table", body = Vec<Rule>),
    )
)]
pub async fn rules_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.watch_service.rules().to_vec()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/rules", get(rules_handler))
}
