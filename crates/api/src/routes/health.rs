//! Liveness and health endpoints.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/favicon.ico", get(favicon))
}

async fn root() -> &'static str {
    "Broadcast service is running"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "broadcast-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
