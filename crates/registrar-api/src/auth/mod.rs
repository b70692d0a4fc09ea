//! Authentication and authorization
//!
//! - `jwt`: session token issue and verification
//! - `password`: Argon2id hashing
//! - `repository`: the credential store (PostgreSQL or in-memory)
//! - `service`: login flow, registration and account self-service
//! - `middleware`: the access control gate and `CurrentAccount` extractor
//! - `models`: request and response bodies

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use jwt::{Claims, IssuedToken, TokenConfig, TokenError, TokenIssuer};
pub use middleware::{bearer_token, require_role, AccessGate, CurrentAccount};
pub use models::{
    AccountPage, AdminAuthPayload, AuthPayload, ChangePasswordRequest, ListAccountsQuery,
    LoginRequest, ProvisionAdmin, RegisterRequest, SessionSecurity, UpdateProfileRequest,
};
pub use password::{validate_password_strength, PasswordConfig, PasswordError, PasswordHasher};
pub use repository::{
    AccountRepository, InMemoryAccountRepository, LoginRecord, PgAccountRepository,
    ProfileUpdate, RepositoryError,
};
pub use service::{default_password, AuthService, LoginOutcome};
