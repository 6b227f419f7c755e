use crate::{Error, Session, session::SessionId};
use async_trait::async_trait;

/// Repository for session data access.
///
/// An in-memory map for tests and single-process deployments, a shared
/// persistent store in production. No session state lives anywhere else.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Insert a new session.
    async fn insert(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by id.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Error>;

    /// Update a session in place (same id).
    async fn update(&self, session: Session) -> Result<Session, Error>;

    /// Replace the session stored under `old_id` with `session`, which
    /// carries the new id. Used for identifier rotation; the old id must no
    /// longer resolve afterwards.
    async fn replace(&self, old_id: &SessionId, session: Session) -> Result<Session, Error>;

    /// Delete a session by id. Deleting a missing session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), Error>;
}
