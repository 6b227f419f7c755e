//! Repository trait for the failed login attempt ledger.
//!
//! The ledger is append-only: rows are inserted on failure and deleted
//! wholesale on a verified successful login, never mutated. Lockout and
//! CAPTCHA escalation are determined by counting recent rows, so old rows
//! only need to be logically ignored, not deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A single failed login attempt.
///
/// Recorded for every failed attempt, including attempts against identifiers
/// that do not exist; anything else would be an enumeration oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// The identifier that was submitted (may or may not exist).
    pub identifier: String,
    /// Source address of the client, when known.
    pub source_address: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn now(identifier: &str, source_address: Option<&str>) -> Self {
        Self {
            identifier: identifier.to_string(),
            source_address: source_address.map(|s| s.to_string()),
            attempted_at: Utc::now(),
        }
    }
}

/// Repository for the login attempt ledger.
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync + 'static {
    /// Append an attempt to the ledger. Duplicate rapid calls each insert a row.
    async fn record(&self, attempt: LoginAttempt) -> Result<(), Error>;

    /// Count attempts for an identifier at or after `since`.
    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u32, Error>;

    /// Delete all attempts for an identifier.
    ///
    /// Called only after a verified successful login.
    ///
    /// # Returns
    ///
    /// The number of rows deleted.
    async fn clear(&self, identifier: &str) -> Result<u64, Error>;
}
