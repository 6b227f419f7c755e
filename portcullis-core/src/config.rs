//! Security configuration
//!
//! The original deployment read these thresholds from string-keyed settings
//! rows; here they are a strongly-typed struct loaded once and passed to the
//! services that need them.

use chrono::Duration;

use crate::error::ValidationError;

/// Thresholds and windows for the authentication subsystem.
///
/// Defaults match the documented configuration surface: 5 attempts within a
/// 15-minute lockout window, CAPTCHA after 2 attempts within an hour, 30
/// minute CSRF tokens, 15 minute idle timeout with 5 minute session rotation,
/// and 1 hour reset tokens.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Failed attempts within `lockout_window` before the identifier is locked.
    pub max_login_attempts: u32,
    /// Rolling window over which `max_login_attempts` is counted.
    pub lockout_window: Duration,
    /// Failed attempts within `captcha_window` before a CAPTCHA is required.
    /// Intentionally lower than `max_login_attempts` so the challenge appears
    /// before the lockout.
    pub captcha_threshold: u32,
    /// Rolling window over which `captcha_threshold` is counted.
    pub captcha_window: Duration,
    /// Lifetime of a CSRF token from issuance, independent of session timeout.
    pub csrf_token_ttl: Duration,
    /// Idle time after which a session is destroyed on next read.
    pub session_idle_timeout: Duration,
    /// How often an active session's identifier is rotated.
    pub session_rotation_interval: Duration,
    /// Lifetime of a password-reset token from issuance.
    pub reset_token_ttl: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_window: Duration::minutes(15),
            captcha_threshold: 2,
            captcha_window: Duration::hours(1),
            csrf_token_ttl: Duration::minutes(30),
            session_idle_timeout: Duration::minutes(15),
            session_rotation_interval: Duration::minutes(5),
            reset_token_ttl: Duration::hours(1),
        }
    }
}

impl SecurityConfig {
    /// Validate the configured values.
    ///
    /// The idle timeout is constrained to 15 minutes - 24 hours; the other
    /// windows and counts only need to be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_login_attempts == 0 {
            return Err(ValidationError::MissingField(
                "max_login_attempts must be at least 1".to_string(),
            ));
        }
        if self.captcha_threshold == 0 {
            return Err(ValidationError::MissingField(
                "captcha_threshold must be at least 1".to_string(),
            ));
        }
        if self.session_idle_timeout < Duration::minutes(15)
            || self.session_idle_timeout > Duration::minutes(1440)
        {
            return Err(ValidationError::MissingField(
                "session_idle_timeout must be between 15 and 1440 minutes".to_string(),
            ));
        }
        for (name, window) in [
            ("lockout_window", self.lockout_window),
            ("captcha_window", self.captcha_window),
            ("csrf_token_ttl", self.csrf_token_ttl),
            ("session_rotation_interval", self.session_rotation_interval),
            ("reset_token_ttl", self.reset_token_ttl),
        ] {
            if window <= Duration::zero() {
                return Err(ValidationError::MissingField(format!(
                    "{name} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the external CAPTCHA verification service.
///
/// When `secret` is `None` the verifier passes every request through, which
/// keeps un-configured deployments working.
#[derive(Debug, Clone, Default)]
pub struct CaptchaConfig {
    /// Shared secret for the verification service. `None` disables verification.
    pub secret: Option<String>,
    /// Verification endpoint. `None` uses the default reCAPTCHA endpoint.
    pub verify_url: Option<String>,
    /// Bound on the server-to-server verification call. Defaults to 5 seconds.
    pub timeout: Option<std::time::Duration>,
}

impl CaptchaConfig {
    pub const DEFAULT_VERIFY_URL: &'static str =
        "https://www.google.com/recaptcha/api/siteverify";
    pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            verify_url: None,
            timeout: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify_url(&self) -> &str {
        self.verify_url.as_deref().unwrap_or(Self::DEFAULT_VERIFY_URL)
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SecurityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_captcha_threshold_below_lockout() {
        // The CAPTCHA must escalate before the lockout does.
        let config = SecurityConfig::default();
        assert!(config.captcha_threshold < config.max_login_attempts);
    }

    #[test]
    fn test_idle_timeout_range_enforced() {
        let mut config = SecurityConfig {
            session_idle_timeout: Duration::minutes(5),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.session_idle_timeout = Duration::minutes(1441);
        assert!(config.validate().is_err());

        config.session_idle_timeout = Duration::minutes(1440);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_captcha_config_defaults() {
        let config = CaptchaConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.verify_url(), CaptchaConfig::DEFAULT_VERIFY_URL);
        assert_eq!(config.timeout(), CaptchaConfig::DEFAULT_TIMEOUT);

        let config = CaptchaConfig::new("secret");
        assert!(config.is_enabled());
    }
}
