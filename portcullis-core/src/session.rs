//! Session state
//!
//! This module contains the core session struct. A session starts anonymous
//! (no user id) so it can carry a CSRF token for the login form, becomes
//! authenticated when a user id is attached, and is destroyed on logout or
//! when idle time exceeds the configured timeout. The identifier is rotated
//! periodically while the session stays active to limit the value of a
//! leaked identifier.
//!
//! | Field               | Type               | Description                                         |
//! | ------------------- | ------------------ | --------------------------------------------------- |
//! | `id`                | `SessionId`        | The unique identifier for the session.              |
//! | `user_id`           | `Option<UserId>`   | The authenticated user, if any.                     |
//! | `csrf`              | `Option<CsrfToken>`| The single live anti-forgery token, stored hashed.  |
//! | `created_at`        | `DateTime`         | When the session was created.                       |
//! | `last_activity_at`  | `DateTime`         | When the session was last read or written.          |
//! | `last_rotated_at`   | `DateTime`         | When the identifier was last rotated.               |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    id::{generate_prefixed_id, validate_prefixed_id},
    user::UserId,
};

/// An opaque session identifier with at least 96 bits of entropy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: &str) -> Self {
        SessionId(id.to_string())
    }

    pub fn new_random() -> Self {
        SessionId(generate_prefixed_id("sess"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "sess")
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single live anti-forgery token for a session.
///
/// Only the SHA-256 hash of the token value is stored; issuing a new token
/// replaces this record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
}

impl CsrfToken {
    pub fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.issued_at > ttl
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The unique identifier for the session.
    pub id: SessionId,

    /// The authenticated user, or `None` for an anonymous session.
    pub user_id: Option<UserId>,

    /// The live CSRF token, if one has been issued.
    pub csrf: Option<CsrfToken>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was last touched.
    pub last_activity_at: DateTime<Utc>,

    /// When the identifier was last rotated.
    pub last_rotated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh anonymous session.
    pub fn anonymous() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new_random(),
            user_id: None,
            csrf: None,
            created_at: now,
            last_activity_at: now,
            last_rotated_at: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether idle time has exceeded `timeout` as of `now`.
    pub fn is_idle_expired_at(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity_at > timeout
    }

    /// Whether the rotation interval has elapsed since the last rotation.
    pub fn is_rotation_due_at(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_rotated_at >= interval
    }
}
