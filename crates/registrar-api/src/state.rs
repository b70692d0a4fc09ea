//! Application state shared across handlers

use std::sync::Arc;
use std::time::Instant;

use registrar_core::AppConfig;

use crate::auth::password::PasswordError;
use crate::auth::{AccessGate, AccountRepository, AuthService};

/// Application state shared across handlers
///
/// Everything here is immutable after startup except what lives behind the
/// repository.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Login flow and account operations
    pub auth: AuthService,
    /// Bearer token gate
    pub gate: AccessGate,
}

impl AppState {
    /// Build state from configuration over the given credential store
    pub fn new(
        config: AppConfig,
        accounts: Arc<dyn AccountRepository>,
    ) -> Result<Self, PasswordError> {
        let auth = AuthService::from_config(accounts, &config.auth)?;
        Ok(Self::with_service(config, auth))
    }

    /// Build state around an already assembled service
    pub fn with_service(config: AppConfig, auth: AuthService) -> Self {
        let gate = AccessGate::new(auth.tokens().clone(), auth.accounts().clone());
        Self {
            config,
            start_time: Instant::now(),
            auth,
            gate,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// In-memory state with a cheap hasher, for tests
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing() -> Self {
        let mut config = AppConfig::default();
        config.server.environment = registrar_core::Environment::Test;
        config.auth.hash_memory_kib = 1024;
        config.auth.hash_iterations = 1;
        config.auth.hash_parallelism = 1;

        let accounts: Arc<dyn AccountRepository> =
            Arc::new(crate::auth::InMemoryAccountRepository::new());
        match Self::new(config, accounts) {
            Ok(state) => state,
            Err(e) => panic!("test hasher parameters rejected: {e}"),
        }
    }
}
