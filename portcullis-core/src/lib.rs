//! Core functionality for the portcullis authentication subsystem
//!
//! This crate contains the security-critical pieces of the CMS: the login
//! state machine with attempt throttling, CAPTCHA escalation and lockout,
//! CSRF token issuance and validation, server-side sessions with idle
//! timeout and identifier rotation, and single-use password-reset tokens.
//!
//! Storage is reached through the repository traits in [`repositories`];
//! the services in [`services`] hold the behaviour. Applications usually
//! consume this crate through the `portcullis` facade rather than directly.

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod repositories;
pub mod services;
pub mod session;
pub mod user;
pub mod validation;

pub use config::{CaptchaConfig, SecurityConfig};
pub use error::Error;
pub use session::{Session, SessionId};
pub use user::{User, UserId, UserStatus};
