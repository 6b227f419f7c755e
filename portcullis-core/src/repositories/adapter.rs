//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so services can be handed an owned `Arc`-backed
//! repository without knowing about the provider.

use crate::{
    Error, Session, User, UserId,
    repositories::{
        CredentialRepository, LoginAttempt, LoginAttemptRepository, RepositoryProvider,
        ResetToken, ResetTokenRepository, SessionRepository,
    },
    session::SessionId,
    user::NewUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct CredentialRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CredentialRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CredentialRepository for CredentialRepositoryAdapter<R> {
    async fn create(&self, new_user: NewUser, password_hash: &str) -> Result<User, Error> {
        self.provider.credential().create(new_user, password_hash).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, Error> {
        self.provider.credential().find_by_identifier(identifier).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.credential().find_by_email(email).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.credential().find_by_id(id).await
    }

    async fn password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.credential().password_hash(user_id).await
    }

    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider.credential().set_password_hash(user_id, hash).await
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), Error> {
        self.provider.credential().record_login(user_id, at).await
    }
}

pub struct LoginAttemptRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LoginAttemptRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LoginAttemptRepository for LoginAttemptRepositoryAdapter<R> {
    async fn record(&self, attempt: LoginAttempt) -> Result<(), Error> {
        self.provider.login_attempt().record(attempt).await
    }

    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u32, Error> {
        self.provider.login_attempt().count_since(identifier, since).await
    }

    async fn clear(&self, identifier: &str) -> Result<u64, Error> {
        self.provider.login_attempt().clear(identifier).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn insert(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().insert(session).await
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Error> {
        self.provider.session().get(id).await
    }

    async fn update(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().update(session).await
    }

    async fn replace(&self, old_id: &SessionId, session: Session) -> Result<Session, Error> {
        self.provider.session().replace(old_id, session).await
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Error> {
        self.provider.session().delete(id).await
    }
}

pub struct ResetTokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> ResetTokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> ResetTokenRepository for ResetTokenRepositoryAdapter<R> {
    async fn create(&self, token: ResetToken) -> Result<ResetToken, Error> {
        self.provider.reset_token().create(token).await
    }

    async fn find(&self, token_hash: &str) -> Result<Option<ResetToken>, Error> {
        self.provider.reset_token().find(token_hash).await
    }

    async fn redeem(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<UserId>, Error> {
        self.provider
            .reset_token()
            .redeem(token_hash, new_password_hash)
            .await
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        self.provider.reset_token().cleanup_expired().await
    }
}
