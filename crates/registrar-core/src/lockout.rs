//! Login lockout state machine
//!
//! An account is `Unlocked` while its failure counter is below the threshold
//! and `Locked` while `lock_until` lies strictly in the future. Failures are
//! counted by [`LockoutPolicy::register_failure`], which every credential
//! store applies inside a single atomic update so concurrent failures cannot
//! lose increments.

use chrono::{DateTime, Duration, Utc};

use crate::account::Account;
use crate::config::AuthConfig;

/// Default number of consecutive failures that triggers a lock
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Default lock duration in minutes
pub const DEFAULT_LOCK_DURATION_MINS: i64 = 15;

/// Longest accepted lock duration in minutes (30 days)
pub const MAX_LOCK_DURATION_MINS: i64 = 30 * 24 * 60;

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures in one cycle before the account locks
    pub max_failed_attempts: u32,
    /// How long a triggered lock lasts
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_duration: Duration::minutes(DEFAULT_LOCK_DURATION_MINS),
        }
    }
}

impl From<&AuthConfig> for LockoutPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lock_duration: Duration::minutes(
                config
                    .lockout_duration_mins
                    .clamp(1, MAX_LOCK_DURATION_MINS),
            ),
        }
    }
}

/// Current lock state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { until: DateTime<Utc> },
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }
}

/// Outcome of applying one failed verification to the stored counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureTransition {
    /// The failure was counted; `lock_until` is the new stored value
    Counted {
        attempts: u32,
        lock_until: Option<DateTime<Utc>>,
    },
    /// The account was already locked; nothing changes
    Rejected { until: DateTime<Utc> },
}

impl FailureTransition {
    /// Whether this transition leaves the account locked
    pub fn locks(&self) -> bool {
        match self {
            FailureTransition::Counted { lock_until, .. } => lock_until.is_some(),
            FailureTransition::Rejected { .. } => true,
        }
    }
}

impl LockoutPolicy {
    /// Lock state for a stored `lock_until` value
    ///
    /// Expiry is a strict comparison: `lock_until == now` is unlocked.
    pub fn state_of(&self, lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LockState {
        match lock_until {
            Some(until) if until > now => LockState::Locked { until },
            _ => LockState::Unlocked,
        }
    }

    /// Lock state of an account
    pub fn state(&self, account: &Account, now: DateTime<Utc>) -> LockState {
        self.state_of(account.lock_until, now)
    }

    /// Apply one failed verification to the stored counters
    ///
    /// - locked: rejected, counters untouched
    /// - lock recorded but expired: a fresh cycle starts at 1
    /// - otherwise: counter + 1, and reaching the threshold sets
    ///   `lock_until = now + lock_duration`
    pub fn register_failure(
        &self,
        attempts: u32,
        lock_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> FailureTransition {
        if let LockState::Locked { until } = self.state_of(lock_until, now) {
            return FailureTransition::Rejected { until };
        }

        let attempts = if lock_until.is_some() {
            1
        } else {
            attempts.saturating_add(1)
        };

        let lock_until = (attempts >= self.max_failed_attempts).then(|| now + self.lock_duration);

        FailureTransition::Counted {
            attempts,
            lock_until,
        }
    }

    /// Attempts left before the account locks
    pub fn attempts_remaining(&self, attempts: u32) -> u32 {
        self.max_failed_attempts.saturating_sub(attempts)
    }
}

/// Whole minutes left on a lock, rounded up
pub fn remaining_lock_minutes(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (until - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + 59_999) / 60_000
    }
}
