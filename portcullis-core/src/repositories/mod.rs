//! Repository traits for the data access layer
//!
//! These traits are the narrow interfaces through which the services reach
//! the relational store. The subsystem never caches what they return: every
//! lockout or CAPTCHA check re-reads storage, so multiple server processes
//! sharing one database stay consistent.
//!
//! The provider system is composable:
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   lifecycle methods

pub mod adapter;
pub mod credential;
pub mod login_attempt;
pub mod reset_token;
pub mod session;

pub use adapter::{
    CredentialRepositoryAdapter, LoginAttemptRepositoryAdapter, ResetTokenRepositoryAdapter,
    SessionRepositoryAdapter,
};
pub use credential::CredentialRepository;
pub use login_attempt::{LoginAttempt, LoginAttemptRepository};
pub use reset_token::{ResetToken, ResetTokenRepository};
pub use session::SessionRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for credential repository access.
pub trait CredentialRepositoryProvider: Send + Sync + 'static {
    /// The credential repository implementation type
    type CredentialRepo: CredentialRepository;

    /// Get the credential repository
    fn credential(&self) -> &Self::CredentialRepo;
}

/// Provider trait for login attempt ledger access.
pub trait LoginAttemptRepositoryProvider: Send + Sync + 'static {
    /// The login attempt repository implementation type
    type LoginAttemptRepo: LoginAttemptRepository;

    /// Get the login attempt repository
    fn login_attempt(&self) -> &Self::LoginAttemptRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for reset token repository access.
pub trait ResetTokenRepositoryProvider: Send + Sync + 'static {
    /// The reset token repository implementation type
    type ResetTokenRepo: ResetTokenRepository;

    /// Get the reset token repository
    fn reset_token(&self) -> &Self::ResetTokenRepo;
}

/// Provider trait that storage implementations implement to supply all
/// repositories, plus a health check.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement `RepositoryProvider` with `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    CredentialRepositoryProvider
    + LoginAttemptRepositoryProvider
    + SessionRepositoryProvider
    + ResetTokenRepositoryProvider
{
    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
