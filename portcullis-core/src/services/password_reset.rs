//! Password-reset token lifecycle: issuance, validation and single-use
//! redemption.
//!
//! Issuance never reveals whether an email address exists: the token is
//! generated and hashed either way, the same success is returned either way,
//! and mail delivery failures are logged rather than surfaced. Redemption is
//! exactly-once, enforced by the repository's atomic consume-and-update
//! rather than by the earlier validation read.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, UserId,
    crypto::{generate_secure_token, hash_token},
    error::AuthError,
    repositories::{CredentialRepository, ResetToken, ResetTokenRepository},
    services::ResetMailer,
    validation::validate_password,
};

/// Service for password-reset operations.
pub struct ResetTokenService<C, T, M>
where
    C: CredentialRepository,
    T: ResetTokenRepository,
    M: ResetMailer,
{
    credentials: Arc<C>,
    tokens: Arc<T>,
    mailer: Arc<M>,
    token_ttl: chrono::Duration,
}

impl<C, T, M> ResetTokenService<C, T, M>
where
    C: CredentialRepository,
    T: ResetTokenRepository,
    M: ResetMailer,
{
    pub fn new(
        credentials: Arc<C>,
        tokens: Arc<T>,
        mailer: Arc<M>,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            credentials,
            tokens,
            mailer,
            token_ttl,
        }
    }

    /// Request a password reset for an email address.
    ///
    /// Succeeds whether or not the address belongs to a user. The token
    /// generation and hashing work happens on both branches so the two are
    /// comparable in timing as well as in response shape.
    pub async fn request_reset(&self, email: &str) -> Result<(), Error> {
        let user = self.credentials.find_by_email(email).await?;

        // Generated unconditionally; the non-existent branch does the same work.
        let token = generate_secure_token();
        let token_hash = hash_token(&token);

        let Some(user) = user else {
            return Ok(());
        };

        self.tokens
            .create(ResetToken {
                token_hash,
                user_id: user.id.clone(),
                expires_at: Utc::now() + self.token_ttl,
                created_at: Utc::now(),
            })
            .await?;

        // Fire-and-forget: a delivery failure must not fail issuance.
        if let Err(e) = self.mailer.send_password_reset(email, &token).await {
            tracing::warn!(error = %e, "Failed to send password reset notification");
        }

        Ok(())
    }

    /// Check a token without consuming it, e.g. before showing the reset form.
    ///
    /// Returns the owning user id when the token exists and has not expired.
    pub async fn validate(&self, token: &str) -> Result<Option<UserId>, Error> {
        let Some(stored) = self.tokens.find(&hash_token(token)).await? else {
            return Ok(None);
        };

        if stored.is_expired_at(Utc::now()) {
            return Ok(None);
        }

        Ok(Some(stored.user_id))
    }

    /// Redeem a token, setting a new password.
    ///
    /// The token is consumed and the password hash written in one
    /// transaction; a token that was already redeemed, has expired, or never
    /// existed fails with a single indistinguishable error and changes
    /// nothing.
    pub async fn redeem(&self, token: &str, new_password: &str) -> Result<UserId, Error> {
        validate_password(new_password)?;

        let new_hash = password_auth::generate_hash(new_password);

        match self.tokens.redeem(&hash_token(token), &new_hash).await? {
            Some(user_id) => {
                tracing::info!(user_id = %user_id, "Password reset redeemed");
                Ok(user_id)
            }
            None => Err(AuthError::InvalidOrExpiredResetToken.into()),
        }
    }

    /// Delete expired tokens.
    pub async fn cleanup_expired(&self) -> Result<u64, Error> {
        self.tokens.cleanup_expired().await
    }
}
