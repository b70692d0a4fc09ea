/// Password hashing and verification using Argon2id
///
/// Digests are PHC strings, so every digest carries its own algorithm,
/// parameters and salt. Verification reads them back from the digest, which
/// lets the cost be raised later without invalidating stored hashes.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use registrar_core::AuthConfig;
use thiserror::Error;

/// Minimum length for passwords chosen by users
pub const MIN_PASSWORD_LEN: usize = 8;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.hash_memory_kib,
            time_cost: config.hash_iterations,
            parallelism: config.hash_parallelism,
        }
    }
}

impl PasswordConfig {
    fn to_params(self) -> Result<Params, PasswordError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(32))
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// Argon2id hasher
///
/// Cheap to clone; clones share the verification counter.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    verifications: Arc<AtomicU64>,
}

impl PasswordHasher {
    pub fn new(config: PasswordConfig) -> Result<Self, PasswordError> {
        Ok(Self {
            params: config.to_params()?,
            verifications: Arc::new(AtomicU64::new(0)),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh random salt, returning a PHC string
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Check a secret against a stored digest
    ///
    /// A mismatch is `Ok(false)`; only an unreadable digest is an error.
    pub fn verify(&self, secret: &str, digest: &str) -> Result<bool, PasswordError> {
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::InvalidHashFormat)?;
        match self.argon2().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(PasswordError::InvalidHashFormat),
        }
    }

    /// [`Self::hash`] on the blocking pool
    pub async fn hash_async(&self, secret: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    /// [`Self::verify`] on the blocking pool
    pub async fn verify_async(&self, secret: String, digest: String) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    /// Number of verifications performed so far
    pub fn verification_count(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }
}

/// Reject passwords too weak to accept from a user
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }

    if password.trim().is_empty() {
        return Err("Password must not be blank".to_string());
    }

    Ok(())
}
