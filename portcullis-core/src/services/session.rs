//! Session lifecycle management.
//!
//! Sessions move `Anonymous → Authenticated` on [`SessionService::start`],
//! stay `Authenticated` across [`SessionService::touch`] calls (with the
//! identifier rotated at a fixed interval), and return to destroyed on
//! [`SessionService::destroy`] or when a touch finds the idle timeout
//! exceeded. An expired session is destroyed by the read that discovers it,
//! before "not logged in" is reported; no stale state survives.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error, Session, UserId,
    repositories::SessionRepository,
    session::SessionId,
};

/// Service owning session creation, rotation, timeout and destruction.
pub struct SessionService<S: SessionRepository> {
    repository: Arc<S>,
    idle_timeout: Duration,
    rotation_interval: Duration,
}

impl<S: SessionRepository> SessionService<S> {
    pub fn new(repository: Arc<S>, idle_timeout: Duration, rotation_interval: Duration) -> Self {
        Self {
            repository,
            idle_timeout,
            rotation_interval,
        }
    }

    /// Create a fresh anonymous session, e.g. to carry the login form's
    /// CSRF token.
    pub async fn create_anonymous(&self) -> Result<Session, Error> {
        self.repository.insert(Session::anonymous()).await
    }

    /// Establish an authenticated session for `user_id`.
    ///
    /// Any prior session state under `previous` is discarded and a brand-new
    /// identifier issued, so a fixated pre-login identifier never survives
    /// into the authenticated session.
    pub async fn start(
        &self,
        previous: Option<&SessionId>,
        user_id: &UserId,
    ) -> Result<Session, Error> {
        if let Some(previous) = previous {
            self.repository.delete(previous).await?;
        }

        let now = Utc::now();
        let session = Session {
            id: SessionId::new_random(),
            user_id: Some(user_id.clone()),
            csrf: None,
            created_at: now,
            last_activity_at: now,
            last_rotated_at: now,
        };

        let session = self.repository.insert(session).await?;
        tracing::debug!(session_id = %session.id, user_id = %user_id, "Session started");
        Ok(session)
    }

    /// Validate and refresh a session.
    ///
    /// Returns `None` if the session does not exist or its idle time has
    /// exceeded the timeout, destroying it in the latter case. Otherwise
    /// updates the activity timestamp, rotates the identifier when the
    /// rotation interval has elapsed, and returns the (possibly re-keyed)
    /// session.
    pub async fn touch(&self, id: &SessionId) -> Result<Option<Session>, Error> {
        let Some(mut session) = self.repository.get(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_idle_expired_at(self.idle_timeout, now) {
            self.repository.delete(id).await?;
            tracing::debug!(session_id = %id, "Session expired; destroyed");
            return Ok(None);
        }

        session.last_activity_at = now;

        if session.is_rotation_due_at(self.rotation_interval, now) {
            let old_id = session.id.clone();
            session.id = SessionId::new_random();
            session.last_rotated_at = now;
            let session = self.repository.replace(&old_id, session).await?;
            tracing::debug!(old_id = %old_id, new_id = %session.id, "Session identifier rotated");
            return Ok(Some(session));
        }

        Ok(Some(self.repository.update(session).await?))
    }

    /// Whether the session is live and bound to a user.
    ///
    /// Read-only apart from destroying the session when its idle time has
    /// expired: no activity refresh and no identifier rotation, so the id
    /// the caller holds stays valid. Callers that want the refresh use
    /// [`SessionService::touch`] and adopt the returned session.
    pub async fn is_authenticated(&self, id: &SessionId) -> Result<bool, Error> {
        let Some(session) = self.repository.get(id).await? else {
            return Ok(false);
        };

        if session.is_idle_expired_at(self.idle_timeout, Utc::now()) {
            self.repository.delete(id).await?;
            tracing::debug!(session_id = %id, "Session expired; destroyed");
            return Ok(false);
        }

        Ok(session.is_authenticated())
    }

    /// Destroy a session, clearing all its state.
    pub async fn destroy(&self, id: &SessionId) -> Result<(), Error> {
        self.repository.delete(id).await
    }
}
