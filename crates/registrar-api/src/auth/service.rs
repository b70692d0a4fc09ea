//! Authentication service layer
//!
//! Composes the credential store, password hasher, lockout policy and token
//! issuer into the login flow and the account self-service operations.
//!
//! Login order matters: lookup, role check (role-restricted entry points
//! only), lock check, secret verification, then either an atomic failure
//! count or a success stamp plus token. A locked account never reaches the
//! hasher.

use std::sync::Arc;

use chrono::Utc;
use registrar_core::{
    normalize_email, remaining_lock_minutes, Account, AccountPublic, AuthConfig,
    FailureTransition, LockState, LockoutPolicy, Role,
};
use uuid::Uuid;
use validator::Validate;

use super::jwt::{IssuedToken, TokenConfig, TokenIssuer};
use super::models::{
    AccountPage, AuthPayload, ChangePasswordRequest, ListAccountsQuery, LoginRequest,
    ProvisionAdmin, RegisterRequest, UpdateProfileRequest,
};
use super::password::{validate_password_strength, PasswordConfig, PasswordError, PasswordHasher};
use super::repository::{AccountRepository, LoginRecord, ProfileUpdate};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;

/// Password assigned when a student registers without one and has no id
pub const FALLBACK_DEFAULT_PASSWORD: &str = "Student123456";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Password derived for registrations that omit one
pub fn default_password(student_id: Option<&str>) -> String {
    match student_id {
        Some(id) => format!("{id}123"),
        None => FALLBACK_DEFAULT_PASSWORD.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The account after the login stamp was written
    pub account: Account,
    pub token: IssuedToken,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
    policy: LockoutPolicy,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: PasswordHasher,
        tokens: Arc<TokenIssuer>,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
            policy,
        }
    }

    /// Build the hasher, token issuer and policy from configuration
    pub fn from_config(
        accounts: Arc<dyn AccountRepository>,
        config: &AuthConfig,
    ) -> Result<Self, PasswordError> {
        Ok(Self::new(
            accounts,
            PasswordHasher::new(PasswordConfig::from(config))?,
            Arc::new(TokenIssuer::new(TokenConfig::from(config))),
            LockoutPolicy::from(config),
        ))
    }

    pub fn accounts(&self) -> &Arc<dyn AccountRepository> {
        &self.accounts
    }

    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Authenticate by email and password
    ///
    /// `required_role` is set only by role-restricted entry points such as
    /// the admin login; the general login accepts every role.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
        required_role: Option<Role>,
    ) -> Result<LoginOutcome, AppError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::MissingCredentials);
        }

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            self.audit_failure(&email, "unknown account", client, None, false);
            return Err(AppError::InvalidCredentials {
                attempts_remaining: None,
            });
        };

        if let Some(role) = required_role {
            if !account.has_role(role) {
                audit_log(&AuditEvent::AccessDenied {
                    account_id: Some(account.id),
                    email: Some(account.email.clone()),
                    resource: "login".to_string(),
                    required_role: Some(role.to_string()),
                    ip_address: client.ip_address.clone(),
                });
                return Err(AppError::Forbidden(format!(
                    "Access denied. {} privileges required.",
                    capitalize(role.as_str())
                )));
            }
        }

        let now = Utc::now();
        if let LockState::Locked { until } = self.policy.state(&account, now) {
            self.audit_failure(&email, "account locked", client, None, true);
            return Err(AppError::Locked {
                minutes: remaining_lock_minutes(until, now),
            });
        }

        let verified = self
            .hasher
            .verify_async(request.password, account.password_hash.clone())
            .await?;

        if !verified {
            let now = Utc::now();
            return match self
                .accounts
                .record_failed_attempt(account.id, &self.policy, now)
                .await?
            {
                FailureTransition::Counted {
                    attempts,
                    lock_until,
                } => {
                    if let Some(until) = lock_until {
                        audit_log(&AuditEvent::AccountLocked {
                            account_id: account.id,
                            email: account.email.clone(),
                            failed_attempts: attempts,
                            locked_until: until,
                            ip_address: client.ip_address.clone(),
                        });
                    }
                    self.audit_failure(
                        &email,
                        "invalid password",
                        client,
                        Some(attempts),
                        lock_until.is_some(),
                    );
                    Err(AppError::InvalidCredentials {
                        attempts_remaining: Some(self.policy.attempts_remaining(attempts)),
                    })
                }
                // Another request locked the account while this one verified
                FailureTransition::Rejected { until } => {
                    self.audit_failure(&email, "account locked", client, None, true);
                    Err(AppError::Locked {
                        minutes: remaining_lock_minutes(until, now),
                    })
                }
            };
        }

        let record = LoginRecord {
            at: now,
            origin: client.ip_address.clone(),
        };
        let account = self.accounts.record_login(account.id, record).await?;
        let token = self.tokens.issue(account.id)?;

        audit_log(&AuditEvent::LoginSuccess {
            account_id: account.id,
            email: account.email.clone(),
            role: account.role.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(LoginOutcome { account, token })
    }

    /// Self-registration; the role is always `student`
    pub async fn register(
        &self,
        mut request: RegisterRequest,
        client: &ClientInfo,
    ) -> Result<AuthPayload, AppError> {
        request.email = normalize_email(&request.email);
        request.first_name = request.first_name.trim().to_string();
        request.last_name = request.last_name.trim().to_string();
        request.student_id = non_empty(request.student_id);
        request.validate()?;

        if self.accounts.find_by_email(&request.email).await?.is_some() {
            self.audit_registration_failure(&request.email, "duplicate email", client);
            return Err(AppError::DuplicateEmail);
        }

        let (password, generated) = match request.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password_strength(&password).map_err(AppError::Validation)?;
                (password, false)
            }
            None => (default_password(request.student_id.as_deref()), true),
        };
        let password_hash = self.hasher.hash_async(password).await?;

        let mut account = Account::new(
            &request.email,
            password_hash,
            Role::Student,
            request.first_name,
            request.last_name,
        );
        account.student_id = request.student_id;
        account.major = non_empty(request.major);
        account.department = non_empty(request.department);
        account.academic_year = non_empty(request.academic_year);
        account.must_change_password = generated;

        let account = match self.accounts.create(account).await {
            Ok(account) => account,
            Err(e) => {
                self.audit_registration_failure(&request.email, &e.to_string(), client);
                return Err(e.into());
            }
        };
        let token = self.tokens.issue(account.id)?;

        audit_log(&AuditEvent::RegistrationSuccess {
            account_id: account.id,
            email: account.email.clone(),
            role: account.role.to_string(),
            ip_address: client.ip_address.clone(),
        });

        Ok(AuthPayload {
            user: account.to_public(),
            token: token.token,
        })
    }

    /// Replace the password after checking the current one
    ///
    /// A wrong current password is a validation error and does not count
    /// toward the lockout.
    pub async fn change_password(
        &self,
        account: &Account,
        request: ChangePasswordRequest,
        client: &ClientInfo,
    ) -> Result<(), AppError> {
        request.validate()?;
        validate_password_strength(&request.new_password).map_err(AppError::Validation)?;

        let current_ok = self
            .hasher
            .verify_async(request.current_password, account.password_hash.clone())
            .await?;
        if !current_ok {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.hasher.hash_async(request.new_password).await?;
        self.accounts
            .update_password(account.id, &password_hash, false)
            .await?;

        audit_log(&AuditEvent::PasswordChange {
            account_id: account.id,
            email: account.email.clone(),
            ip_address: client.ip_address.clone(),
        });
        Ok(())
    }

    pub async fn update_profile(
        &self,
        account_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<AccountPublic, AppError> {
        let request = UpdateProfileRequest {
            first_name: request.first_name.map(|v| v.trim().to_string()),
            last_name: request.last_name.map(|v| v.trim().to_string()),
        };
        request.validate()?;

        let update = ProfileUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
        };
        let account = self.accounts.update_profile(account_id, update).await?;
        Ok(account.to_public())
    }

    /// Fresh public view of an account
    pub async fn profile(&self, account_id: Uuid) -> Result<AccountPublic, AppError> {
        self.get_account(account_id).await
    }

    pub async fn get_account(&self, account_id: Uuid) -> Result<AccountPublic, AppError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .map(|a| a.to_public())
            .ok_or_else(|| AppError::NotFound("Account".to_string()))
    }

    pub async fn list_accounts(&self, query: ListAccountsQuery) -> Result<AccountPage, AppError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        let accounts = self.accounts.list(query.role, limit, offset).await?;
        let total = self.accounts.count(query.role).await?;

        Ok(AccountPage {
            users: accounts.iter().map(Account::to_public).collect(),
            total,
            limit,
            offset,
        })
    }

    /// Clear an account's lock before it expires
    pub async fn unlock_account(
        &self,
        account_id: Uuid,
        unlocked_by: Option<Uuid>,
    ) -> Result<AccountPublic, AppError> {
        let account = self.accounts.unlock(account_id).await?;

        audit_log(&AuditEvent::AccountUnlocked {
            account_id: account.id,
            email: account.email.clone(),
            unlocked_by,
        });
        Ok(account.to_public())
    }

    /// Create an administrator out of band
    ///
    /// The password must be changed on first login.
    pub async fn provision_admin(&self, request: ProvisionAdmin) -> Result<Account, AppError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        validate_password_strength(&request.password).map_err(AppError::Validation)?;

        let password_hash = self.hasher.hash_async(request.password).await?;
        let mut account = Account::new(
            &email,
            password_hash,
            Role::Admin,
            request.first_name,
            request.last_name,
        );
        account.department = non_empty(request.department);
        account.must_change_password = true;

        let account = self.accounts.create(account).await?;
        audit_log(&AuditEvent::RegistrationSuccess {
            account_id: account.id,
            email: account.email.clone(),
            role: account.role.to_string(),
            ip_address: None,
        });
        Ok(account)
    }

    fn audit_failure(
        &self,
        email: &str,
        reason: &str,
        client: &ClientInfo,
        failed_attempts: Option<u32>,
        account_locked: bool,
    ) {
        audit_log(&AuditEvent::LoginFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            failed_attempts,
            account_locked,
        });
    }

    fn audit_registration_failure(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::RegistrationFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
        });
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
