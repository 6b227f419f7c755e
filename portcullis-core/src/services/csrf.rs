//! Anti-forgery token issuance and validation.
//!
//! Each session holds at most one live CSRF token; issuing a new one
//! replaces the previous value. Tokens expire a fixed interval after
//! issuance, independent of the session's own idle timeout, and validation
//! compares in constant time against the stored hash.
//!
//! Every state-changing request must validate before performing any effect.
//! A failed validation reports nothing beyond "invalid request"; in
//! particular callers cannot tell a missing token from an expired one.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error, Session,
    crypto::{generate_secure_token, hash_token, verify_token_hash},
    repositories::SessionRepository,
    session::{CsrfToken, SessionId},
};

/// Issues and validates per-session anti-forgery tokens.
pub struct CsrfGuard<S: SessionRepository> {
    repository: Arc<S>,
    token_ttl: Duration,
    session_idle_timeout: Duration,
}

impl<S: SessionRepository> CsrfGuard<S> {
    pub fn new(
        repository: Arc<S>,
        token_ttl: Duration,
        session_idle_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            token_ttl,
            session_idle_timeout,
        }
    }

    /// Fetch the session, destroying it if its idle time has expired. An
    /// expired session must not anchor a token in either direction.
    async fn live_session(&self, session_id: &SessionId) -> Result<Option<Session>, Error> {
        let Some(session) = self.repository.get(session_id).await? else {
            return Ok(None);
        };

        if session.is_idle_expired_at(self.session_idle_timeout, Utc::now()) {
            self.repository.delete(session_id).await?;
            tracing::debug!(session_id = %session_id, "Session expired; destroyed");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Issue a fresh token for the session and return the plaintext value.
    ///
    /// The stored record keeps only the hash. Any previously issued token
    /// for this session stops validating immediately.
    pub async fn issue(&self, session_id: &SessionId) -> Result<String, Error> {
        let Some(mut session) = self.live_session(session_id).await? else {
            return Err(Error::Session(crate::error::SessionError::NotFound));
        };

        let token = generate_secure_token();
        session.csrf = Some(CsrfToken {
            token_hash: hash_token(&token),
            issued_at: Utc::now(),
        });
        self.repository.update(session).await?;

        Ok(token)
    }

    /// Validate a submitted token for the session.
    ///
    /// Returns `false` when the session is gone or idle-expired, no token
    /// is stored, the stored token has expired, or the supplied value does
    /// not match. Storage errors propagate; they are never mapped to a
    /// boolean.
    pub async fn validate(
        &self,
        session_id: &SessionId,
        supplied_token: &str,
    ) -> Result<bool, Error> {
        let Some(session) = self.live_session(session_id).await? else {
            return Ok(false);
        };

        let Some(csrf) = session.csrf else {
            return Ok(false);
        };

        if csrf.is_expired_at(self.token_ttl, Utc::now()) {
            return Ok(false);
        }

        Ok(verify_token_hash(supplied_token, &csrf.token_hash))
    }
}
