use crate::{
    Error, User, UserId,
    user::NewUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for user credential data access.
///
/// The password hash is exposed only through this trait and never as a field
/// on [`User`], so a user value handed to presentation code cannot leak it.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Create a new user with the given password hash.
    async fn create(&self, new_user: NewUser, password_hash: &str) -> Result<User, Error>;

    /// Find a user by login identifier (username or email address).
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, Error>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Retrieve a user's password hash.
    async fn password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error>;

    /// Replace a user's password hash.
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error>;

    /// Record a successful login at the given time.
    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), Error>;
}
