//! Outbound notification seam for password-reset delivery.
//!
//! Actual delivery (SMTP, a transactional provider, queueing) lives outside
//! this subsystem; the reset flow only needs somewhere to hand the token.
//! Send failures must not fail reset issuance, or deliverability would
//! become an enumeration oracle.

use async_trait::async_trait;

use crate::Error;

/// Sender for password-reset notifications.
#[async_trait]
pub trait ResetMailer: Send + Sync + 'static {
    /// Deliver a reset token to the address, typically as a link embedding
    /// the token.
    async fn send_password_reset(&self, to: &str, reset_token: &str) -> Result<(), Error>;
}

/// Mailer that only logs, for development and for deployments without an
/// outbound mail path.
///
/// The token itself is not logged.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_password_reset(&self, to: &str, _reset_token: &str) -> Result<(), Error> {
        tracing::info!(to, "Password reset requested; no mail transport configured");
        Ok(())
    }
}
