//! Liveness endpoint.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::AppState;

/// Reports service liveness and the running version.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates the health check route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
