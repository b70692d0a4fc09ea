//! Account administration handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use registrar_core::Role;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{CurrentAccount, ListAccountsQuery};
use crate::error::{ApiResponse, AppError};
use crate::state::AppState;

fn parse_account_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Account".to_string()))
}

/// `GET /users` (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
    query: Result<Query<ListAccountsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    current.require(&[Role::Admin], "users")?;
    let Query(query) = query?;

    let page = state.auth.list_accounts(query).await?;
    Ok(Json(ApiResponse::ok("Users retrieved", page)))
}

/// `GET /users/:id` (admin, or the account itself)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_account_id(&id)?;
    if current.account.id != id {
        current.require(&[Role::Admin], "users/:id")?;
    }

    let user = state.auth.get_account(id).await?;
    Ok(Json(ApiResponse::ok("User retrieved", json!({ "user": user }))))
}

/// `POST /users/:id/unlock` (admin)
pub async fn unlock_user(
    State(state): State<Arc<AppState>>,
    current: CurrentAccount,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    current.require(&[Role::Admin], "users/:id/unlock")?;
    let id = parse_account_id(&id)?;

    let user = state
        .auth
        .unlock_account(id, Some(current.account.id))
        .await?;
    Ok(Json(ApiResponse::ok(
        "Account unlocked",
        json!({ "user": user }),
    )))
}
