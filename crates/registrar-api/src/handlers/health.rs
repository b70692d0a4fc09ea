//! Health check handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::error::ApiResponse;
use crate::state::AppState;

/// Liveness check
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(
        "Server is running",
        json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.server.environment.as_str(),
            "uptimeSeconds": state.uptime_secs(),
            "timestamp": Utc::now(),
        }),
    ))
}

/// Readiness check: the credential store must answer
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.auth.accounts().count(None).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::ok("Ready", json!({ "ready": true }))),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "credential store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::failure(
                    "SERVER_ERROR",
                    "Credential store unavailable",
                    Some(json!({ "ready": false })),
                )),
            )
        }
    }
}
