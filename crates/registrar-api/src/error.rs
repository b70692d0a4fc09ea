//! Response envelope and request-boundary errors
//!
//! Every response body, success or failure, is an [`ApiResponse`]:
//! `{ success, message, data?, code? }`. Failures carry a stable `code`
//! that clients branch on; `data` holds error extras such as
//! `attemptsRemaining` or `lockTimeRemaining`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::auth::repository::RepositoryError;

/// Response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: None,
        }
    }
}

impl ApiResponse<Value> {
    /// Success with no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            code: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
            code: Some(code.to_string()),
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Email or password absent from a login request
    MissingCredentials,
    Validation(String),
    /// Unknown email and wrong password look the same to the caller;
    /// only the latter knows how many attempts remain.
    InvalidCredentials { attempts_remaining: Option<u32> },
    NoToken,
    InvalidToken,
    Forbidden(String),
    Locked { minutes: i64 },
    DuplicateEmail,
    DuplicateStudentId,
    NotFound(String),
    PayloadTooLarge,
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredentials => "MISSING_CREDENTIALS",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidCredentials { .. } => "INVALID_CREDENTIALS",
            AppError::NoToken => "NO_TOKEN",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Forbidden(_) => "INSUFFICIENT_PRIVILEGES",
            AppError::Locked { .. } => "ACCOUNT_LOCKED",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::DuplicateStudentId => "DUPLICATE_STUDENT_ID",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredentials | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials { .. } | AppError::NoToken | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Locked { .. } => StatusCode::LOCKED,
            AppError::DuplicateEmail | AppError::DuplicateStudentId => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(detail)
            | AppError::Forbidden(detail)
            | AppError::Internal(detail) => write!(f, "{}: {}", self.code(), detail),
            AppError::NotFound(resource) => write!(f, "{}: {} not found", self.code(), resource),
            AppError::Locked { minutes } => {
                write!(f, "{}: locked for {} more minutes", self.code(), minutes)
            }
            _ => f.write_str(self.code()),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, data) = match self {
            AppError::MissingCredentials => ("Email and password are required".to_string(), None),
            AppError::Validation(msg) => (msg, None),
            AppError::InvalidCredentials { attempts_remaining } => (
                "Invalid credentials".to_string(),
                attempts_remaining.map(|n| json!({ "attemptsRemaining": n })),
            ),
            AppError::NoToken => ("Access denied. No token provided.".to_string(), None),
            AppError::InvalidToken => ("Invalid token".to_string(), None),
            AppError::Forbidden(msg) => (msg, None),
            AppError::Locked { minutes } => (
                format!("Account temporarily locked. Try again in {minutes} minutes."),
                Some(json!({ "lockTimeRemaining": minutes })),
            ),
            AppError::DuplicateEmail => ("User with this email already exists".to_string(), None),
            AppError::DuplicateStudentId => {
                ("User with this student ID already exists".to_string(), None)
            }
            AppError::NotFound(resource) => (format!("{resource} not found"), None),
            AppError::PayloadTooLarge => ("Request body too large".to_string(), None),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                ("Internal server error".to_string(), None)
            }
        };

        (status, Json(ApiResponse::failure(code, message, data))).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => AppError::DuplicateEmail,
            RepositoryError::DuplicateStudentId => AppError::DuplicateStudentId,
            RepositoryError::AccountNotFound => AppError::NotFound("Account".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(_) => AppError::Internal(err.to_string()),
            TokenError::Expired | TokenError::Malformed | TokenError::InvalidSignature => {
                AppError::InvalidToken
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
