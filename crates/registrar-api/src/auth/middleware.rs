/// Access control gate
///
/// `authenticate` turns the request's `Authorization` header into a live
/// [`Account`]; `require_role` is a plain membership test on that account.
/// Handlers compose the two explicitly: naming [`CurrentAccount`] in a
/// handler's arguments runs `authenticate`, and the handler calls
/// [`CurrentAccount::require`] where a role is needed.
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use registrar_core::{remaining_lock_minutes, Account, Role};

use super::jwt::TokenIssuer;
use super::repository::AccountRepository;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use crate::state::AppState;

/// Pull the token out of an `Authorization` header value
///
/// Absent header or a bare `Bearer` is `NoToken`; any other scheme is
/// `InvalidToken`. The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let value = header
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::NoToken)?;

    let mut parts = value.splitn(2, char::is_whitespace);
    let scheme = parts.next().unwrap_or("");
    let token = parts.next().map(str::trim).unwrap_or("");

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::InvalidToken);
    }
    if token.is_empty() {
        return Err(AppError::NoToken);
    }
    Ok(token)
}

/// Allow the account through only if its role is in `allowed`
///
/// No hierarchy: `Admin` is not implicitly a `Student`.
pub fn require_role(account: &Account, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&account.role) {
        return Ok(());
    }

    let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
    Err(AppError::Forbidden(format!(
        "Access denied. Required role: {}",
        names.join(" or ")
    )))
}

/// Verifies bearer tokens and resolves them to accounts
#[derive(Clone)]
pub struct AccessGate {
    tokens: Arc<TokenIssuer>,
    accounts: Arc<dyn AccountRepository>,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenIssuer>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { tokens, accounts }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Account, AppError> {
        self.authenticate_at(headers, Utc::now()).await
    }

    /// Resolve the bearer token in `headers` as of `now`
    ///
    /// The account is re-read on every call, so role changes and locks take
    /// effect without waiting for the token to expire.
    pub async fn authenticate_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        let header = match headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                reject(headers, "authorization header is not ASCII");
                AppError::InvalidToken
            })?),
            None => None,
        };
        let token = bearer_token(header).map_err(|e| {
            if matches!(e, AppError::InvalidToken) {
                reject(headers, "unsupported authorization scheme");
            }
            e
        })?;

        let account_id = self.tokens.verify_at(token, now).map_err(|e| {
            reject(headers, &e.to_string());
            AppError::InvalidToken
        })?;

        let Some(account) = self.accounts.find_by_id(account_id).await? else {
            reject(headers, "account no longer exists");
            return Err(AppError::InvalidToken);
        };

        match account.lock_until {
            Some(until) if until > now => Err(AppError::Locked {
                minutes: remaining_lock_minutes(until, now),
            }),
            _ => Ok(account),
        }
    }
}

fn reject(headers: &HeaderMap, reason: &str) {
    let client = ClientInfo::from_headers(headers);
    audit_log(&AuditEvent::InvalidToken {
        ip_address: client.ip_address,
        user_agent: client.user_agent,
        reason: reason.to_string(),
    });
}

/// The authenticated caller of a handler
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub account: Account,
    pub client: ClientInfo,
}

impl CurrentAccount {
    /// [`require_role`], with denials written to the audit log
    pub fn require(&self, allowed: &[Role], resource: &str) -> Result<(), AppError> {
        require_role(&self.account, allowed).map_err(|e| {
            audit_log(&AuditEvent::AccessDenied {
                account_id: Some(self.account.id),
                email: Some(self.account.email.clone()),
                resource: resource.to_string(),
                required_role: allowed.first().map(Role::to_string),
                ip_address: self.client.ip_address.clone(),
            });
            e
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let account = state.gate.authenticate(&parts.headers).await?;
        Ok(Self {
            account,
            client: ClientInfo::from_headers(&parts.headers),
        })
    }
}
