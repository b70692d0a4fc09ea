//! Request and response bodies for the authentication endpoints

use chrono::{DateTime, Utc};
use registrar_core::{AccountPublic, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body
///
/// Missing fields deserialize as empty so the flow can answer
/// `MISSING_CREDENTIALS` instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Self-registration request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    /// Absent or empty means a default password is derived
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "Student ID must be 1-32 characters"))]
    pub student_id: Option<String>,

    #[serde(default)]
    pub major: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,
}

/// Query string for the account listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAccountsQuery {
    pub role: Option<Role>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Out-of-band admin provisioning
#[derive(Debug, Clone)]
pub struct ProvisionAdmin {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
}

/// Account summary plus session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: AccountPublic,
    pub token: String,
}

/// Session details returned by the admin login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSecurity {
    pub session_expiry: DateTime<Utc>,
    pub login_ip: Option<String>,
    pub requires_password_change: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuthPayload {
    pub user: AccountPublic,
    pub token: String,
    pub security: SessionSecurity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPage {
    pub users: Vec<AccountPublic>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
