// handlers/public/root.rs - GET / and GET /health

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::AppState;

pub async fn root() -> impl IntoResponse {
    ApiResponse::success(json!({
        "name": "SensorHub API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": "/health, /organizations, /auth/login, /auth/signup",
            "session": "/auth/whoami, /auth/logout, /organization, /users",
            "entities": "/things, /sensors, /chartpresets, /rawdatapresets, /operators",
        }
    }))
}

/// Liveness plus a round trip to the backing stores
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "store": state.store.backend(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("Database temporarily unavailable").into_response()
        }
    }
}
