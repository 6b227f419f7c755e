//! Service layer for the authentication subsystem
//!
//! Each service encapsulates one concern from the security design: attempt
//! tracking, CAPTCHA verification, CSRF tokens, session lifecycle and the
//! password-reset flow, with [`AuthService`] composing them into the login
//! state machine.

pub mod attempts;
pub mod auth;
pub mod captcha;
pub mod csrf;
pub mod mailer;
pub mod password_reset;
pub mod session;

pub use attempts::AttemptLedger;
pub use auth::AuthService;
pub use captcha::{CaptchaVerifier, HttpCaptchaVerifier};
pub use csrf::CsrfGuard;
pub use mailer::{LogMailer, ResetMailer};
pub use password_reset::ResetTokenService;
pub use session::SessionService;
