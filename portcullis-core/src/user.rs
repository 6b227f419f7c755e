//! User credentials
//!
//! This module contains the core user struct for the single-administrator
//! credential store. The password hash is deliberately not a field on
//! [`User`]; it is only reachable through the credential repository so it
//! never travels with the user value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
};

/// A unique, stable identifier for a specific user.
///
/// This value should be treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier for the user.
    pub id: UserId,

    /// Unique login name.
    pub username: String,

    /// Unique email address, also accepted as a login identifier and used
    /// for password-reset delivery.
    pub email: String,

    /// Whether the account may sign in.
    pub status: UserStatus,

    /// The timestamp of the last successful login, if any.
    pub last_login_at: Option<DateTime<Utc>>,

    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,

    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Parameters for creating a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
}

impl NewUser {
    pub fn builder() -> NewUserBuilder {
        NewUserBuilder::default()
    }

    pub fn new(username: String, email: String) -> Result<Self, ValidationError> {
        NewUserBuilder::default()
            .username(username)
            .email(email)
            .build()
    }
}

#[derive(Default)]
pub struct NewUserBuilder {
    id: Option<UserId>,
    username: Option<String>,
    email: Option<String>,
    status: Option<UserStatus>,
}

impl NewUserBuilder {
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            id: self.id.unwrap_or_default(),
            username: self
                .username
                .ok_or_else(|| ValidationError::MissingField("username".to_string()))?,
            email: self
                .email
                .ok_or_else(|| ValidationError::MissingField("email".to_string()))?,
            status: self.status.unwrap_or(UserStatus::Active),
        })
    }
}
