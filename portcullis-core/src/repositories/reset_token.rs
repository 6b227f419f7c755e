//! Repository trait for password-reset tokens.
//!
//! Tokens are stored hashed (SHA-256 of the 256-bit value the user receives)
//! and are single-use: redemption consumes the row and writes the new
//! password hash in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, UserId};

/// A stored password-reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    /// SHA-256 hash of the token value; the plaintext is never stored.
    pub token_hash: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Repository for password-reset token data access.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync + 'static {
    /// Store a new reset token for a user.
    async fn create(&self, token: ResetToken) -> Result<ResetToken, Error>;

    /// Find a token by hash without consuming it.
    ///
    /// Expiry is not checked here; callers check it against their own clock.
    async fn find(&self, token_hash: &str) -> Result<Option<ResetToken>, Error>;

    /// Atomically consume the token and update the owner's password hash.
    ///
    /// Implementations must perform the token delete and the password update
    /// in a single transaction, keyed on the token row itself, so that of N
    /// concurrent redemption attempts with the same token exactly one
    /// succeeds. Expiry is checked inside the critical section.
    ///
    /// # Returns
    ///
    /// The owner's id when the token was live and has now been consumed,
    /// `None` when it was missing, expired or already consumed.
    async fn redeem(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<UserId>, Error>;

    /// Delete expired tokens.
    async fn cleanup_expired(&self) -> Result<u64, Error>;
}
