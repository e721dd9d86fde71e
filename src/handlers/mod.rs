use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::{json, Value};

use crate::store::AppState;

pub mod auth;
pub mod data;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Geomark API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "register": "POST /register (public)",
            "login": "POST /login (public)",
            "features": "GET|POST /data, PUT|DELETE /data/:id (bearer token)"
        }
    }))
}

/// GET /health - liveness probe that also pings the store
pub async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unavailable"
                })),
            )
        }
    }
}
