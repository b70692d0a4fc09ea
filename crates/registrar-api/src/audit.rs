//! Security audit logging
//!
//! Every authentication and access-control decision worth reviewing later is
//! emitted as an [`AuditEvent`] on the `"audit"` tracing target, serialized
//! to JSON so log shippers can route it separately from application logs.
//! Secrets never appear in events.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        account_id: Uuid,
        email: String,
        role: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        failed_attempts: Option<u32>,
        account_locked: bool,
    },

    /// The failure that pushed an account over the threshold
    AccountLocked {
        account_id: Uuid,
        email: String,
        failed_attempts: u32,
        locked_until: DateTime<Utc>,
        ip_address: Option<String>,
    },

    AccountUnlocked {
        account_id: Uuid,
        email: String,
        unlocked_by: Option<Uuid>,
    },

    RegistrationSuccess {
        account_id: Uuid,
        email: String,
        role: String,
        ip_address: Option<String>,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
    },

    PasswordChange {
        account_id: Uuid,
        email: String,
        ip_address: Option<String>,
    },

    Logout {
        account_id: Uuid,
        email: String,
        ip_address: Option<String>,
    },

    AccessDenied {
        account_id: Option<Uuid>,
        email: Option<String>,
        resource: String,
        required_role: Option<String>,
        ip_address: Option<String>,
    },

    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::AccountLocked { .. } => "Account locked",
            AuditEvent::AccountUnlocked { .. } => "Account unlocked",
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::PasswordChange { .. } => "Password changed",
            AuditEvent::Logout { .. } => "User logout",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::InvalidToken { .. } => "Invalid token",
        }
    }

    fn is_alert(&self) -> bool {
        matches!(
            self,
            AuditEvent::AccountLocked { .. } | AuditEvent::AccessDenied { .. }
        )
    }
}

/// Client details attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event on the `"audit"` target
///
/// Lockouts and access denials go out at WARN, everything else at INFO.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    if event.is_alert() {
        warn!(
            target: "audit",
            timestamp = %timestamp,
            event = %event_json,
            "{}",
            event.summary()
        );
    } else {
        info!(
            target: "audit",
            timestamp = %timestamp,
            event = %event_json,
            "{}",
            event.summary()
        );
    }
}

/// Client address: first `X-Forwarded-For` entry, else `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(str::to_string)
}
