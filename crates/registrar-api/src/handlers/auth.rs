//! Authentication API handlers
//!
//! Thin adapters: parse the body, gather client details from the headers,
//! call [`crate::auth::AuthService`], wrap the result in the envelope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use registrar_core::Role;
use serde_json::json;

use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::auth::{
    AdminAuthPayload, AuthPayload, ChangePasswordRequest, CurrentAccount, LoginRequest,
    RegisterRequest, SessionSecurity, UpdateProfileRequest,
};
use crate::error::{ApiResponse, AppError};
use crate::state::AppState;

/// `POST /auth/register`
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let client = ClientInfo::from_headers(&headers);

    let registered = state.auth.register(request, &client).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User registered successfully", registered)),
    ))
}

/// `POST /auth/login`
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let client = ClientInfo::from_headers(&headers);

    let outcome = state.auth.login(request, &client, None).await?;

    Ok(Json(ApiResponse::ok(
        "Login successful",
        AuthPayload {
            user: outcome.account.to_public(),
            token: outcome.token.token,
        },
    )))
}

/// `POST /auth/admin-login`
///
/// Same flow as the general login, restricted to admin accounts, plus
/// session details in the response.
pub async fn admin_login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let client = ClientInfo::from_headers(&headers);

    let outcome = state
        .auth
        .login(request, &client, Some(Role::Admin))
        .await?;

    Ok(Json(ApiResponse::ok(
        "Admin login successful",
        AdminAuthPayload {
            user: outcome.account.to_public(),
            token: outcome.token.token,
            security: SessionSecurity {
                session_expiry: outcome.token.expires_at,
                login_ip: client.ip_address,
                requires_password_change: outcome.account.must_change_password,
            },
        },
    )))
}

/// `POST /auth/logout`
///
/// Tokens are stateless; this only records the event. The client discards
/// its token.
pub async fn logout_handler(current: CurrentAccount) -> impl IntoResponse {
    audit_log(&AuditEvent::Logout {
        account_id: current.account.id,
        email: current.account.email.clone(),
        ip_address: current.client.ip_address.clone(),
    });

    Json(ApiResponse::message("Logged out successfully"))
}

/// `GET /auth/me`
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.profile(current.account.id).await?;
    Ok(Json(ApiResponse::ok("Profile retrieved", json!({ "user": user }))))
}

/// `PUT /auth/profile`
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let user = state
        .auth
        .update_profile(current.account.id, request)
        .await?;
    Ok(Json(ApiResponse::ok(
        "Profile updated successfully",
        json!({ "user": user }),
    )))
}

/// `PUT /auth/change-password`
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    state
        .auth
        .change_password(&current.account, request, &current.client)
        .await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}
