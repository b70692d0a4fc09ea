//! Registrar API - authentication and access control over HTTP
//!
//! Serves the login, registration and account endpoints of the student
//! records service. Every response uses the `{ success, message, data?,
//! code? }` envelope from [`error::ApiResponse`].

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::{cors_layer, security_headers_middleware};
use crate::state::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server);
    let body_limit = state.config.server.max_body_size;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", routes::api_routes())
        .layer(from_fn(security_headers_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router over in-memory state, for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(AppState::for_testing()))
}
