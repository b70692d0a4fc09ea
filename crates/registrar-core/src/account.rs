//! Account records
//!
//! An [`Account`] is the persistent identity record: who the user is, the
//! hashed secret, the role, and the lockout counters. Only the credential
//! store mutates it; everything handed to clients goes through
//! [`AccountPublic`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RegistrarError;

/// Coarse capability class used for endpoint-level access control
///
/// There is no hierarchy: `Admin` does not imply `Student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// Convert role to its stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RegistrarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(RegistrarError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize an email address for lookup and uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account record
///
/// `email` is stored normalized. `lock_until`, when present and in the
/// future, means the account is locked; see [`crate::lockout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier
    pub id: Uuid,

    /// Normalized email address (unique, used for login)
    pub email: String,

    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,

    pub first_name: String,
    pub last_name: String,

    /// Student identifier (unique when present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,

    /// Consecutive failed login attempts in the current cycle
    #[serde(default)]
    pub failed_login_attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_until: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_ip: Option<String>,

    /// Set for provisioned or defaulted passwords
    #[serde(default)]
    pub must_change_password: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a fresh identifier and clean lockout state
    ///
    /// The email is normalized here so every store sees the same key.
    pub fn new(
        email: &str,
        password_hash: String,
        role: Role,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            role,
            first_name: first_name.into(),
            last_name: last_name.into(),
            student_id: None,
            major: None,
            department: None,
            academic_year: None,
            failed_login_attempts: 0,
            lock_until: None,
            last_login: None,
            last_login_ip: None,
            must_change_password: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account is locked at `now` (equality counts as expired)
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if until > now)
    }

    /// Whether the account holds the given role
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Convert to the public representation (no secret, no lockout counters)
    pub fn to_public(&self) -> AccountPublic {
        AccountPublic {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role,
            student_id: self.student_id.clone(),
            major: self.major.clone(),
            department: self.department.clone(),
            academic_year: self.academic_year.clone(),
            last_login: self.last_login,
            must_change_password: self.must_change_password,
            created_at: self.created_at,
        }
    }
}

/// Public account representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPublic {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}
