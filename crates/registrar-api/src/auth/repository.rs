//! Credential store
//!
//! [`AccountRepository`] is the only writer of account records. Two
//! implementations are provided:
//!
//! - [`PgAccountRepository`]: PostgreSQL via sqlx. Failed attempts are a
//!   single conditional `UPDATE ... RETURNING`, so concurrent failures on one
//!   account serialize on the row lock.
//! - [`InMemoryAccountRepository`]: a `RwLock<HashMap>` whose write lock is
//!   held across every read-modify-write. Used for tests and for running
//!   without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registrar_core::{Account, FailureTransition, LockState, LockoutPolicy, Role};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Student ID already exists")]
    DuplicateStudentId,

    #[error("Corrupt account record: {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return match db.constraint() {
                    Some(STUDENT_ID_CONSTRAINT) => RepositoryError::DuplicateStudentId,
                    _ => RepositoryError::DuplicateEmail,
                };
            }
        }
        RepositoryError::DatabaseError(err.to_string())
    }
}

/// What a successful login writes back
///
/// Recording a login always clears the failure counter and any recorded
/// lock in the same write.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub at: DateTime<Utc>,
    pub origin: Option<String>,
}

/// Self-service profile changes; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account, enforcing email and student id uniqueness
    async fn create(&self, account: Account) -> Result<Account, RepositoryError>;

    /// Look up by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError>;

    /// Count one failed verification atomically
    ///
    /// Applies [`LockoutPolicy::register_failure`] to the stored counters as
    /// one indivisible step. Returns `Rejected` without writing anything when
    /// the account is locked at `now`.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureTransition, RepositoryError>;

    /// Stamp a successful login and clear lockout state atomically
    async fn record_login(&self, id: Uuid, record: LoginRecord) -> Result<Account, RepositoryError>;

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), RepositoryError>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Account, RepositoryError>;

    /// Clear the failure counter and lock
    async fn unlock(&self, id: Uuid) -> Result<Account, RepositoryError>;

    /// Newest first
    async fn list(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError>;

    async fn count(&self, role: Option<Role>) -> Result<i64, RepositoryError>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::DuplicateEmail);
        }
        if let Some(student_id) = &account.student_id {
            if accounts
                .values()
                .any(|a| a.student_id.as_ref() == Some(student_id))
            {
                return Err(RepositoryError::DuplicateStudentId);
            }
        }

        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureTransition, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(RepositoryError::AccountNotFound)?;

        let transition =
            policy.register_failure(account.failed_login_attempts, account.lock_until, now);
        if let FailureTransition::Counted {
            attempts,
            lock_until,
        } = transition
        {
            account.failed_login_attempts = attempts;
            account.lock_until = lock_until;
            account.updated_at = now;
        }

        Ok(transition)
    }

    async fn record_login(&self, id: Uuid, record: LoginRecord) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(RepositoryError::AccountNotFound)?;

        account.failed_login_attempts = 0;
        account.lock_until = None;
        account.last_login = Some(record.at);
        account.last_login_ip = record.origin;
        account.updated_at = record.at;

        Ok(account.clone())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(RepositoryError::AccountNotFound)?;

        account.password_hash = password_hash.to_string();
        account.must_change_password = must_change_password;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(RepositoryError::AccountNotFound)?;

        if let Some(first_name) = update.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            account.last_name = last_name;
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn unlock(&self, id: Uuid) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(RepositoryError::AccountNotFound)?;

        account.failed_login_attempts = 0;
        account.lock_until = None;
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn list(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        let accounts = self.accounts.read().await;
        let mut matching: Vec<Account> = accounts
            .values()
            .filter(|a| role.map_or(true, |r| a.role == r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, role: Option<Role>) -> Result<i64, RepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .filter(|a| role.map_or(true, |r| a.role == r))
            .count() as i64)
    }
}

// ============================================================================
// PostgreSQL implementation
// ============================================================================

const STUDENT_ID_CONSTRAINT: &str = "accounts_student_id_key";

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('student', 'admin')),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    student_id TEXT,
    major TEXT,
    department TEXT,
    academic_year TEXT,
    failed_login_attempts INTEGER NOT NULL DEFAULT 0 CHECK (failed_login_attempts >= 0),
    lock_until TIMESTAMPTZ,
    last_login TIMESTAMPTZ,
    last_login_ip TEXT,
    must_change_password BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT accounts_email_key UNIQUE (email),
    CONSTRAINT accounts_student_id_key UNIQUE (student_id)
)
"#;

/// Row shape of the `accounts` table
#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    first_name: String,
    last_name: String,
    student_id: Option<String>,
    major: Option<String>,
    department: Option<String>,
    academic_year: Option<String>,
    failed_login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    last_login_ip: Option<String>,
    must_change_password: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))?;
        let failed_login_attempts = u32::try_from(row.failed_login_attempts)
            .map_err(|_| RepositoryError::InvalidRecord("negative failure counter".to_string()))?;

        Ok(Account {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            first_name: row.first_name,
            last_name: row.last_name,
            student_id: row.student_id,
            major: row.major,
            department: row.department,
            academic_year: row.academic_year,
            failed_login_attempts,
            lock_until: row.lock_until,
            last_login: row.last_login,
            last_login_ip: row.last_login_ip,
            must_change_password: row.must_change_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_account(row: Option<AccountRow>) -> Result<Account, RepositoryError> {
    row.ok_or(RepositoryError::AccountNotFound)?.try_into()
}

/// PostgreSQL-backed credential store
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `accounts` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_ACCOUNTS_TABLE)
            .execute(&self.pool)
            .await?;
        tracing::debug!("accounts schema ready");
        Ok(())
    }

    async fn lock_until_of(&self, id: Uuid) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row: Option<(Option<DateTime<Utc>>,)> =
            sqlx::query_as("SELECT lock_until FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(lock_until,)| lock_until)
            .ok_or(RepositoryError::AccountNotFound)
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, RepositoryError> {
        let attempts = i32::try_from(account.failed_login_attempts)
            .map_err(|_| RepositoryError::InvalidRecord("failure counter overflow".to_string()))?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, role, first_name, last_name,
                student_id, major, department, academic_year,
                failed_login_attempts, lock_until, last_login, last_login_ip,
                must_change_password, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.student_id)
        .bind(&account.major)
        .bind(&account.department)
        .bind(&account.academic_year)
        .bind(attempts)
        .bind(account.lock_until)
        .bind(account.last_login)
        .bind(&account.last_login_ip)
        .bind(account.must_change_password)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureTransition, RepositoryError> {
        let threshold = i32::try_from(policy.max_failed_attempts).unwrap_or(i32::MAX);
        let locked_until = now + policy.lock_duration;

        // A lock still on the row here has expired (the WHERE clause filters
        // active ones), so the cycle restarts at 1.
        let updated: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            WITH next AS (
                SELECT id,
                       CASE WHEN lock_until IS NOT NULL THEN 1
                            ELSE failed_login_attempts + 1
                       END AS attempts
                FROM accounts
                WHERE id = $1 AND (lock_until IS NULL OR lock_until <= $2)
                FOR UPDATE
            )
            UPDATE accounts AS a
            SET failed_login_attempts = next.attempts,
                lock_until = CASE WHEN next.attempts >= $3 THEN $4 ELSE NULL END,
                updated_at = $2
            FROM next
            WHERE a.id = next.id
            RETURNING a.failed_login_attempts, a.lock_until
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(threshold)
        .bind(locked_until)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((attempts, lock_until)) = updated {
            let attempts = u32::try_from(attempts)
                .map_err(|_| RepositoryError::InvalidRecord("negative failure counter".to_string()))?;
            return Ok(FailureTransition::Counted {
                attempts,
                lock_until,
            });
        }

        // No row updated: either missing or locked
        match policy.state_of(self.lock_until_of(id).await?, now) {
            LockState::Locked { until } => Ok(FailureTransition::Rejected { until }),
            LockState::Unlocked => Err(RepositoryError::DatabaseError(
                "failed attempt not recorded".to_string(),
            )),
        }
    }

    async fn record_login(&self, id: Uuid, record: LoginRecord) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET failed_login_attempts = 0,
                lock_until = NULL,
                last_login = $2,
                last_login_ip = $3,
                updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.at)
        .bind(&record.origin)
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, must_change_password = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(must_change_password)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AccountNotFound);
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn unlock(&self, id: Uuid) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET failed_login_attempts = 0, lock_until = NULL, updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        into_account(row)
    }

    async fn list(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE ($1::text IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn count(&self, role: Option<Role>) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE ($1::text IS NULL OR role = $1)")
                .bind(role.map(|r| r.as_str()))
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
