//! Registrar Core - Account model, lockout policy, and shared configuration
//!
//! This crate defines the domain pieces the HTTP service and the CLI share:
//! - Account records and roles
//! - The login lockout state machine
//! - Configuration management
//! - Common error types

pub mod account;
pub mod config;
pub mod lockout;

pub use account::{normalize_email, Account, AccountPublic, Role};
pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, ServerConfig};
pub use lockout::{remaining_lock_minutes, FailureTransition, LockState, LockoutPolicy};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Registrar domain operations
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
