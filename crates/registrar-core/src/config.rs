//! Registrar Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::lockout::{
    DEFAULT_LOCK_DURATION_MINS, DEFAULT_MAX_FAILED_ATTEMPTS, MAX_LOCK_DURATION_MINS,
};

/// Signing secret used when `JWT_SECRET` is unset. Rejected in production.
pub const DEV_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Default session token lifetime (30 days)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted session token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Authentication and session settings
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load from `REGISTRAR_CONFIG` if set, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("REGISTRAR_CONFIG") {
            Ok(path) => Self::from_file(path)?.with_env_override(),
            Err(_) => Self::from_env(),
        }
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.server.port = port;
        }
        if let Some(environment) = parse_env("APP_ENV")? {
            self.server.environment = environment;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(max) = parse_env("DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = max;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(expire) = std::env::var("JWT_EXPIRE") {
            self.auth.token_ttl_secs =
                parse_duration_secs(&expire).ok_or(ConfigError::InvalidValue {
                    key: "JWT_EXPIRE".to_string(),
                    value: expire,
                })?;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(max) = parse_env("AUTH_MAX_LOGIN_ATTEMPTS")? {
            self.auth.max_failed_attempts = max;
        }
        if let Some(mins) = parse_env("AUTH_LOCKOUT_DURATION_MINS")? {
            self.auth.lockout_duration_mins = mins;
        }
        if let Some(kib) = parse_env("AUTH_HASH_MEMORY_KIB")? {
            self.auth.hash_memory_kib = kib;
        }
        if let Some(iterations) = parse_env("AUTH_HASH_ITERATIONS")? {
            self.auth.hash_iterations = iterations;
        }
        if let Some(lanes) = parse_env("AUTH_HASH_PARALLELISM")? {
            self.auth.hash_parallelism = lanes;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Reject settings that would break the lockout or token guarantees
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.max_failed_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_MAX_LOGIN_ATTEMPTS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.auth.lockout_duration_mins <= 0
            || self.auth.lockout_duration_mins > MAX_LOCK_DURATION_MINS
        {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_LOCKOUT_DURATION_MINS".to_string(),
                value: self.auth.lockout_duration_mins.to_string(),
            });
        }
        if self.auth.token_ttl_secs == 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRE".to_string(),
                value: self.auth.token_ttl_secs.to_string(),
            });
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        if self.server.environment == Environment::Production {
            if self.auth.jwt_secret == DEV_JWT_SECRET {
                return Err(ConfigError::MissingRequired(
                    "JWT_SECRET (development secret is not allowed in production)".to_string(),
                ));
            }
            if self.auth.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::InvalidValue {
                    key: "JWT_SECRET".to_string(),
                    value: format!("<{} bytes>", self.auth.jwt_secret.len()),
                });
            }
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// Parse a lifetime such as `30d`, `12h`, `45m`, `90s` or plain seconds
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits.parse().ok()?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };

    value.checked_mul(multiplier)
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Deployment environment
    pub environment: Environment,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: Environment::Development,
            max_body_size: 10 * 1024, // 10KB
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Without one the service keeps accounts in memory.
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret for session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,

    /// Token issuer identifier
    pub issuer: String,

    /// Consecutive failed logins before the account locks
    pub max_failed_attempts: u32,

    /// Lock duration in minutes
    pub lockout_duration_mins: i64,

    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,

    /// Argon2 iterations
    pub hash_iterations: u32,

    /// Argon2 lanes
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            issuer: "registrar".to_string(),
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration_mins: DEFAULT_LOCK_DURATION_MINS,
            hash_memory_kib: 19 * 1024,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full EnvFilter string)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
