//! ID generation utilities with prefix support
//!
//! IDs are generated with at least 96 bits of entropy and are URL-safe,
//! in the form `{prefix}_{random}`.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Generate a prefixed ID with at least 96 bits of entropy.
///
/// # Panics
///
/// Panics if the OS random number generator fails, which indicates a
/// critical system failure (e.g. /dev/urandom unavailable) from which
/// recovery is not possible for security-sensitive operations.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

/// Validate that a prefixed ID has the expected format.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(rest) = id.strip_prefix(expected_prefix) else {
        return false;
    };
    let Some(encoded) = rest.strip_prefix('_') else {
        return false;
    };

    // 12 random bytes encode to 16 base64 characters.
    encoded.len() >= 16 && BASE64_URL_SAFE_NO_PAD.decode(encoded).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefixed_id() {
        let id = generate_prefixed_id("usr");
        assert!(id.starts_with("usr_"));
        assert!(validate_prefixed_id(&id, "usr"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = generate_prefixed_id("sess");
        let b = generate_prefixed_id("sess");
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_rejects_wrong_prefix() {
        let id = generate_prefixed_id("usr");
        assert!(!validate_prefixed_id(&id, "sess"));
    }

    #[test]
    fn test_validate_rejects_short_or_malformed() {
        assert!(!validate_prefixed_id("usr_", "usr"));
        assert!(!validate_prefixed_id("usr_short", "usr"));
        assert!(!validate_prefixed_id("usr-no-underscore", "usr"));
        assert!(!validate_prefixed_id("usr_%%%%%%%%%%%%%%%%", "usr"));
    }
}
