//! API route definitions

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, health, users};
use crate::state::AppState;

/// Routes mounted under `/api`
///
/// Authentication is per handler: every handler that takes
/// `CurrentAccount` requires a bearer token, and role checks happen inside
/// the handler.
pub fn api_routes() -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/admin-login", post(auth::admin_login_handler));

    let authenticated_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/profile", put(auth::update_profile_handler))
        .route("/auth/change-password", put(auth::change_password_handler))
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/unlock", post(users::unlock_user));

    public_routes.merge(authenticated_routes)
}
