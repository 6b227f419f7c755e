//! Failed login attempt tracking with lockout and CAPTCHA escalation.
//!
//! This module implements account-based brute force protection with
//! per-identifier attempt tracking over two rolling windows: a short lockout
//! window and a longer CAPTCHA window with a lower threshold, so the
//! challenge appears before the lockout does.
//!
//! # Failure semantics
//!
//! Storage errors propagate to the caller, which denies the login. A ledger
//! that cannot be read never answers "not locked".
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_core::services::AttemptLedger;
//! use portcullis_core::SecurityConfig;
//!
//! let ledger = AttemptLedger::new(repository, SecurityConfig::default());
//!
//! if ledger.is_locked("admin").await? {
//!     // Return AccountLocked to the client
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, SecurityConfig,
    repositories::{LoginAttempt, LoginAttemptRepository},
};

/// Service answering lockout and CAPTCHA-escalation queries over the
/// append-only attempt ledger.
///
/// Lockout state is never cached in-process; every query re-reads storage so
/// multiple server processes sharing one database agree.
pub struct AttemptLedger<R: LoginAttemptRepository> {
    repository: Arc<R>,
    config: SecurityConfig,
}

impl<R: LoginAttemptRepository> AttemptLedger<R> {
    pub fn new(repository: Arc<R>, config: SecurityConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Append a failed attempt for the identifier.
    ///
    /// Recorded for every failed attempt, existing account or not.
    pub async fn record_failure(
        &self,
        identifier: &str,
        source_address: Option<&str>,
    ) -> Result<(), Error> {
        self.repository
            .record(LoginAttempt::now(identifier, source_address))
            .await
    }

    /// Whether the identifier has reached the lockout threshold within the
    /// lockout window.
    pub async fn is_locked(&self, identifier: &str) -> Result<bool, Error> {
        let since = Utc::now() - self.config.lockout_window;
        let count = self.repository.count_since(identifier, since).await?;
        Ok(count >= self.config.max_login_attempts)
    }

    /// Whether the identifier has reached the CAPTCHA threshold within the
    /// CAPTCHA window. The threshold is lower than the lockout threshold, so
    /// the challenge escalates first.
    pub async fn captcha_required(&self, identifier: &str) -> Result<bool, Error> {
        let since = Utc::now() - self.config.captcha_window;
        let count = self.repository.count_since(identifier, since).await?;
        Ok(count >= self.config.captcha_threshold)
    }

    /// Delete all attempts for the identifier.
    ///
    /// Called only after a verified successful login, and only once the new
    /// session has been durably started.
    pub async fn clear(&self, identifier: &str) -> Result<(), Error> {
        let cleared = self.repository.clear(identifier).await?;
        if cleared > 0 {
            tracing::debug!(identifier, cleared, "Cleared login attempt ledger");
        }
        Ok(())
    }
}
