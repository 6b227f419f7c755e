//! In-memory storage backend for portcullis
//!
//! Implements the repository traits over concurrent maps. Suitable for
//! tests and single-process deployments; production installs sharing state
//! across processes should implement the traits over their relational
//! store instead.
//!
//! The one operation with a real atomicity contract, reset-token
//! redemption, is serialized under a single async mutex so that of N
//! concurrent redemptions of the same token exactly one consumes it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use portcullis_core::{
    Error, Session, User, UserId,
    repositories::{
        CredentialRepository, CredentialRepositoryProvider, LoginAttempt,
        LoginAttemptRepository, LoginAttemptRepositoryProvider, RepositoryProvider, ResetToken,
        ResetTokenRepository, ResetTokenRepositoryProvider, SessionRepository,
        SessionRepositoryProvider,
    },
    session::SessionId,
    user::NewUser,
};

/// Shared password-hash table, keyed by user id.
///
/// Both the credential repository and the reset-token repository write to
/// it; sharing one map is what lets `redeem` apply the token delete and the
/// password update together.
type PasswordHashes = Arc<DashMap<String, String>>;

pub struct MemoryCredentialRepository {
    users: DashMap<String, User>,
    hashes: PasswordHashes,
}

impl MemoryCredentialRepository {
    fn new(hashes: PasswordHashes) -> Self {
        Self {
            users: DashMap::new(),
            hashes,
        }
    }
}

#[async_trait]
impl CredentialRepository for MemoryCredentialRepository {
    async fn create(&self, new_user: NewUser, password_hash: &str) -> Result<User, Error> {
        let duplicate = self.users.iter().any(|entry| {
            entry.value().username == new_user.username || entry.value().email == new_user.email
        });
        if duplicate {
            return Err(Error::Storage(portcullis_core::error::StorageError::Database(
                "username or email already exists".to_string(),
            )));
        }

        let now = Utc::now();
        let user = User {
            id: new_user.id,
            username: new_user.username,
            email: new_user.email,
            status: new_user.status,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.hashes
            .insert(user.id.as_str().to_string(), password_hash.to_string());
        self.users
            .insert(user.id.as_str().to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .iter()
            .find(|entry| {
                entry.value().username == identifier || entry.value().email == identifier
            })
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        Ok(self.users.get(id.as_str()).map(|entry| entry.value().clone()))
    }

    async fn password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        Ok(self.hashes.get(user_id.as_str()).map(|entry| entry.value().clone()))
    }

    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.hashes
            .insert(user_id.as_str().to_string(), hash.to_string());
        Ok(())
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), Error> {
        if let Some(mut entry) = self.users.get_mut(user_id.as_str()) {
            entry.last_login_at = Some(at);
            entry.updated_at = at;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLoginAttemptRepository {
    attempts: DashMap<String, Vec<LoginAttempt>>,
}

#[async_trait]
impl LoginAttemptRepository for MemoryLoginAttemptRepository {
    async fn record(&self, attempt: LoginAttempt) -> Result<(), Error> {
        self.attempts
            .entry(attempt.identifier.clone())
            .or_default()
            .push(attempt);
        Ok(())
    }

    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u32, Error> {
        Ok(self
            .attempts
            .get(identifier)
            .map(|rows| rows.iter().filter(|a| a.attempted_at >= since).count() as u32)
            .unwrap_or(0))
    }

    async fn clear(&self, identifier: &str) -> Result<u64, Error> {
        Ok(self
            .attempts
            .remove(identifier)
            .map(|(_, rows)| rows.len() as u64)
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<String, Session>,
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .insert(session.id.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, Error> {
        Ok(self.sessions.get(id.as_str()).map(|entry| entry.value().clone()))
    }

    async fn update(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .insert(session.id.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn replace(&self, old_id: &SessionId, session: Session) -> Result<Session, Error> {
        self.sessions.remove(old_id.as_str());
        self.sessions
            .insert(session.id.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Error> {
        self.sessions.remove(id.as_str());
        Ok(())
    }
}

pub struct MemoryResetTokenRepository {
    tokens: Mutex<HashMap<String, ResetToken>>,
    hashes: PasswordHashes,
}

impl MemoryResetTokenRepository {
    fn new(hashes: PasswordHashes) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            hashes,
        }
    }
}

#[async_trait]
impl ResetTokenRepository for MemoryResetTokenRepository {
    async fn create(&self, token: ResetToken) -> Result<ResetToken, Error> {
        self.tokens
            .lock()
            .await
            .insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find(&self, token_hash: &str) -> Result<Option<ResetToken>, Error> {
        Ok(self.tokens.lock().await.get(token_hash).cloned())
    }

    async fn redeem(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<UserId>, Error> {
        // The critical section: remove-if-live and the password write happen
        // under one lock, standing in for the single-row transactional
        // delete a SQL backend would use.
        let mut tokens = self.tokens.lock().await;

        let user_id = match tokens.get(token_hash) {
            Some(token) if !token.is_expired_at(Utc::now()) => token.user_id.clone(),
            _ => return Ok(None),
        };

        tokens.remove(token_hash);
        self.hashes
            .insert(user_id.as_str().to_string(), new_password_hash.to_string());
        Ok(Some(user_id))
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        let now = Utc::now();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}

/// In-memory implementation of [`RepositoryProvider`].
pub struct MemoryRepositoryProvider {
    credential: MemoryCredentialRepository,
    login_attempt: MemoryLoginAttemptRepository,
    session: MemorySessionRepository,
    reset_token: MemoryResetTokenRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        let hashes: PasswordHashes = Arc::new(DashMap::new());
        Self {
            credential: MemoryCredentialRepository::new(hashes.clone()),
            login_attempt: MemoryLoginAttemptRepository::default(),
            session: MemorySessionRepository::default(),
            reset_token: MemoryResetTokenRepository::new(hashes),
        }
    }
}

impl Default for MemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialRepositoryProvider for MemoryRepositoryProvider {
    type CredentialRepo = MemoryCredentialRepository;

    fn credential(&self) -> &Self::CredentialRepo {
        &self.credential
    }
}

impl LoginAttemptRepositoryProvider for MemoryRepositoryProvider {
    type LoginAttemptRepo = MemoryLoginAttemptRepository;

    fn login_attempt(&self) -> &Self::LoginAttemptRepo {
        &self.login_attempt
    }
}

impl SessionRepositoryProvider for MemoryRepositoryProvider {
    type SessionRepo = MemorySessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl ResetTokenRepositoryProvider for MemoryRepositoryProvider {
    type ResetTokenRepo = MemoryResetTokenRepository;

    fn reset_token(&self) -> &Self::ResetTokenRepo {
        &self.reset_token
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
