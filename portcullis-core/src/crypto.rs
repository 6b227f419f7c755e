//! Cryptographic utilities for secure token handling
//!
//! This module provides secure token generation, hashing and constant-time
//! verification for the tokens this crate hands to clients: session
//! identifiers, CSRF tokens and password-reset tokens.
//!
//! Token verification is vulnerable to timing attacks when using standard
//! string comparison because the comparison may exit early on the first
//! mismatch. This module addresses that by:
//!
//! 1. Storing SHA-256 hashes of tokens instead of plaintext tokens
//! 2. Using constant-time comparison via the `subtle` crate
//!
//! SHA-256 (rather than argon2) is sufficient here because these tokens
//! carry 256 bits of entropy; brute-forcing the hash is infeasible, and the
//! memory-hard password hash would only add latency.

use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a cryptographically secure random token.
///
/// Produces a 256-bit (32-byte) random token encoded as URL-safe base64
/// without padding (43 characters).
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure from which recovery is not possible for security-sensitive
/// operations.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32]; // 256 bits of entropy
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for storage using SHA-256.
///
/// The hash is deterministic, so it doubles as the lookup key for the token
/// row. Returns a hex-encoded digest.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Verify a token against a stored hash with constant-time comparison.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Perform constant-time comparison of two byte slices.
///
/// The comparison takes the same amount of time regardless of where (or if)
/// the bytes differ. Length is not secret.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
