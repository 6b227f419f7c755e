//! Login orchestration: the attempt ledger, CAPTCHA verifier, credential
//! store and session manager composed into the login state machine.
//!
//! Per identifier the states escalate `Normal → CaptchaRequired → Locked`
//! within their respective windows, and only a successful login (which
//! clears the ledger) resets them. Checks run in a fixed order: lockout
//! first (it takes precedence over everything, including a correct
//! password), then the CAPTCHA, then the credential itself. A failed
//! attempt is never recorded before the lockout check has passed, and the
//! ledger is never cleared before the new session is durably stored.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, Session, User,
    error::AuthError,
    repositories::{CredentialRepository, LoginAttemptRepository, SessionRepository},
    services::{AttemptLedger, CaptchaVerifier, SessionService},
    session::SessionId,
};

/// Orchestrates login, logout and the associated ledger bookkeeping.
pub struct AuthService<C, A, S, V>
where
    C: CredentialRepository,
    A: LoginAttemptRepository,
    S: SessionRepository,
    V: CaptchaVerifier,
{
    credentials: Arc<C>,
    attempts: AttemptLedger<A>,
    sessions: SessionService<S>,
    captcha: Arc<V>,
}

impl<C, A, S, V> AuthService<C, A, S, V>
where
    C: CredentialRepository,
    A: LoginAttemptRepository,
    S: SessionRepository,
    V: CaptchaVerifier,
{
    pub fn new(
        credentials: Arc<C>,
        attempts: AttemptLedger<A>,
        sessions: SessionService<S>,
        captcha: Arc<V>,
    ) -> Self {
        Self {
            credentials,
            attempts,
            sessions,
            captcha,
        }
    }

    pub fn attempts(&self) -> &AttemptLedger<A> {
        &self.attempts
    }

    pub fn sessions(&self) -> &SessionService<S> {
        &self.sessions
    }

    /// Whether the next login attempt for this identifier must carry a
    /// CAPTCHA response. Used to render the challenge on the login form.
    pub async fn captcha_required(&self, identifier: &str) -> Result<bool, Error> {
        self.attempts.captcha_required(identifier).await
    }

    /// Attempt a login.
    ///
    /// `previous_session` is the caller's current (typically anonymous)
    /// session, whose state is discarded when a fresh authenticated session
    /// is issued.
    ///
    /// Failure modes, in evaluation order: [`AuthError::AccountLocked`]
    /// (checked first, even a correct password does not bypass it),
    /// [`AuthError::CaptchaFailed`] (counts as a failed attempt, since the
    /// credential check is skipped), [`AuthError::InvalidCredentials`]
    /// (unknown identifier and wrong password are indistinguishable),
    /// [`AuthError::AccountInactive`] (not a guessing signal, so it does not
    /// count as a failed attempt).
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        captcha_response: Option<&str>,
        source_address: Option<&str>,
        previous_session: Option<&SessionId>,
    ) -> Result<(User, Session), Error> {
        if self.attempts.is_locked(identifier).await? {
            tracing::info!(identifier, "Login rejected: identifier locked");
            return Err(AuthError::AccountLocked.into());
        }

        if self.attempts.captcha_required(identifier).await?
            && !self.captcha.verify(captcha_response, source_address).await?
        {
            // The credential check is skipped, so the attempt is recorded
            // here; otherwise captcha failures would be free guesses.
            self.attempts.record_failure(identifier, source_address).await?;
            return Err(AuthError::CaptchaFailed.into());
        }

        let verified = match self.credentials.find_by_identifier(identifier).await? {
            Some(user) => {
                let hash = self.credentials.password_hash(&user.id).await?;
                hash.is_some_and(|hash| {
                    password_auth::verify_password(password, &hash).is_ok()
                })
                .then_some(user)
            }
            // Unknown identifier: no hash to verify. The distinction never
            // leaves this function.
            None => None,
        };

        let Some(mut user) = verified else {
            self.attempts.record_failure(identifier, source_address).await?;
            return Err(AuthError::InvalidCredentials.into());
        };

        if !user.is_active() {
            return Err(AuthError::AccountInactive.into());
        }

        let now = Utc::now();
        self.credentials.record_login(&user.id, now).await?;
        user.last_login_at = Some(now);

        // Session first, ledger second: a crash in between leaves stale
        // attempts, never a cleared ledger without a session.
        let session = self.sessions.start(previous_session, &user.id).await?;
        self.attempts.clear(identifier).await?;

        tracing::info!(user_id = %user.id, "Login successful");
        Ok((user, session))
    }

    /// Destroy the session.
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), Error> {
        self.sessions.destroy(session_id).await
    }
}
