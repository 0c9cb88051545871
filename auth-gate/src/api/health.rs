use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Basic health check handler
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
