//! # Portcullis
//!
//! Portcullis is the authentication and session-security layer of a small
//! business CMS. It owns the login state machine (failed-attempt tracking,
//! CAPTCHA escalation, lockout), CSRF token issuance and validation,
//! server-side sessions with idle timeout and identifier rotation, and
//! single-use password-reset tokens.
//!
//! Storage is pluggable through [`RepositoryProvider`]; the HTTP layer,
//! HTML rendering and mail delivery stay outside this crate and talk to it
//! through the methods on [`Portcullis`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use portcullis::Portcullis;
//! use portcullis_storage_memory::MemoryRepositoryProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let repositories = Arc::new(MemoryRepositoryProvider::new());
//!     let portcullis = Portcullis::new(repositories);
//!
//!     let session = portcullis.create_session().await.unwrap();
//!     let csrf = portcullis.issue_csrf_token(&session.id).await.unwrap();
//!     // render the login form carrying `csrf`, then on submit:
//!     // portcullis.validate_csrf_token(&session.id, &submitted).await?;
//!     // portcullis.login(...).await?;
//! }
//! ```

use std::sync::Arc;

use portcullis_core::{
    repositories::{
        CredentialRepository, CredentialRepositoryAdapter, LoginAttemptRepositoryAdapter,
        ResetTokenRepositoryAdapter, SessionRepositoryAdapter,
    },
    services::{AttemptLedger, AuthService, CsrfGuard, ResetTokenService, SessionService},
    validation::{validate_email, validate_password},
};

/// Re-export core types
///
/// These types are commonly used when working with the Portcullis API.
pub use portcullis_core::{
    CaptchaConfig, Error, SecurityConfig, Session, SessionId, User, UserId, UserStatus,
    error::{AuthError, SessionError, StorageError, ValidationError},
    repositories::RepositoryProvider,
    services::{CaptchaVerifier, HttpCaptchaVerifier, LogMailer, ResetMailer},
    user::NewUser,
};

/// The assembled authentication subsystem.
///
/// Generic over the storage provider `R`, the CAPTCHA verifier `V`
/// (defaults to the HTTP verifier, which passes everything through until a
/// secret is configured) and the reset mailer `M` (defaults to logging).
pub struct Portcullis<R, V = HttpCaptchaVerifier, M = LogMailer>
where
    R: RepositoryProvider,
    V: CaptchaVerifier,
    M: ResetMailer,
{
    repositories: Arc<R>,
    config: SecurityConfig,
    auth: AuthService<
        CredentialRepositoryAdapter<R>,
        LoginAttemptRepositoryAdapter<R>,
        SessionRepositoryAdapter<R>,
        V,
    >,
    sessions: SessionService<SessionRepositoryAdapter<R>>,
    csrf: CsrfGuard<SessionRepositoryAdapter<R>>,
    reset: ResetTokenService<CredentialRepositoryAdapter<R>, ResetTokenRepositoryAdapter<R>, M>,
    credentials: Arc<CredentialRepositoryAdapter<R>>,
}

impl<R: RepositoryProvider> Portcullis<R> {
    /// Create an instance with default configuration, a pass-through
    /// CAPTCHA verifier and a logging mailer.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_config(repositories, SecurityConfig::default())
    }

    /// Create an instance with the given security configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; use
    /// [`Portcullis::with_collaborators`] for fallible construction.
    pub fn with_config(repositories: Arc<R>, config: SecurityConfig) -> Self {
        Self::with_collaborators(
            repositories,
            config,
            Arc::new(HttpCaptchaVerifier::new(CaptchaConfig::default())),
            Arc::new(LogMailer),
        )
        .expect("default collaborators with a validated config")
    }

    /// Create an instance verifying CAPTCHAs against the configured service.
    pub fn with_captcha(
        repositories: Arc<R>,
        config: SecurityConfig,
        captcha: CaptchaConfig,
    ) -> Result<Self, Error> {
        Self::with_collaborators(
            repositories,
            config,
            Arc::new(HttpCaptchaVerifier::new(captcha)),
            Arc::new(LogMailer),
        )
    }
}

impl<R, V, M> Portcullis<R, V, M>
where
    R: RepositoryProvider,
    V: CaptchaVerifier,
    M: ResetMailer,
{
    /// Create an instance with explicit CAPTCHA and mailer collaborators.
    pub fn with_collaborators(
        repositories: Arc<R>,
        config: SecurityConfig,
        captcha: Arc<V>,
        mailer: Arc<M>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let credentials = Arc::new(CredentialRepositoryAdapter::new(repositories.clone()));
        let attempts = Arc::new(LoginAttemptRepositoryAdapter::new(repositories.clone()));
        let sessions_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let reset_tokens = Arc::new(ResetTokenRepositoryAdapter::new(repositories.clone()));

        let auth = AuthService::new(
            credentials.clone(),
            AttemptLedger::new(attempts, config.clone()),
            SessionService::new(
                sessions_repo.clone(),
                config.session_idle_timeout,
                config.session_rotation_interval,
            ),
            captcha,
        );
        let sessions = SessionService::new(
            sessions_repo.clone(),
            config.session_idle_timeout,
            config.session_rotation_interval,
        );
        let csrf = CsrfGuard::new(
            sessions_repo,
            config.csrf_token_ttl,
            config.session_idle_timeout,
        );
        let reset = ResetTokenService::new(
            credentials.clone(),
            reset_tokens,
            mailer,
            config.reset_token_ttl,
        );

        Ok(Self {
            repositories,
            config,
            auth,
            sessions,
            csrf,
            reset,
            credentials,
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Health check for the underlying storage.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    // --- provisioning -----------------------------------------------------

    /// Create a user with the given password.
    ///
    /// Validates the email format and password strength, hashes the
    /// password with argon2 and stores the credential.
    pub async fn create_user(&self, new_user: NewUser, password: &str) -> Result<User, Error> {
        validate_email(&new_user.email)?;
        validate_password(password)?;
        let hash = password_auth::generate_hash(password);
        self.credentials.create(new_user, &hash).await
    }

    // --- login / logout ---------------------------------------------------

    /// Attempt a login. See [`AuthService::login`] for the failure modes
    /// and their ordering.
    ///
    /// [`AuthService::login`]: portcullis_core::services::AuthService::login
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        captcha_response: Option<&str>,
        source_address: Option<&str>,
        previous_session: Option<&SessionId>,
    ) -> Result<(User, Session), Error> {
        self.auth
            .login(
                identifier,
                password,
                captcha_response,
                source_address,
                previous_session,
            )
            .await
    }

    /// Destroy the session.
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), Error> {
        self.auth.logout(session_id).await
    }

    /// Whether the next login attempt for this identifier must carry a
    /// CAPTCHA response.
    pub async fn captcha_required(&self, identifier: &str) -> Result<bool, Error> {
        self.auth.captcha_required(identifier).await
    }

    // --- sessions ---------------------------------------------------------

    /// Create an anonymous session, e.g. to carry the login form's CSRF
    /// token.
    pub async fn create_session(&self) -> Result<Session, Error> {
        self.sessions.create_anonymous().await
    }

    /// Validate and refresh a session; returns `None` (destroying the
    /// session) once idle time exceeds the timeout. The returned session
    /// may carry a rotated identifier the caller must adopt.
    pub async fn touch_session(&self, session_id: &SessionId) -> Result<Option<Session>, Error> {
        self.sessions.touch(session_id).await
    }

    /// Whether the session is live and bound to a user.
    ///
    /// Read-only: the identifier is never rotated by this check, so the id
    /// the caller holds stays valid. Use [`Portcullis::touch_session`] on
    /// request boundaries to refresh activity and pick up rotations.
    pub async fn is_authenticated(&self, session_id: &SessionId) -> Result<bool, Error> {
        self.sessions.is_authenticated(session_id).await
    }

    // --- CSRF -------------------------------------------------------------

    /// Issue a fresh anti-forgery token for the session, replacing any
    /// previous one.
    pub async fn issue_csrf_token(&self, session_id: &SessionId) -> Result<String, Error> {
        self.csrf.issue(session_id).await
    }

    /// Validate a submitted anti-forgery token. Callers must reject the
    /// request before performing any effect when this returns `false`.
    pub async fn validate_csrf_token(
        &self,
        session_id: &SessionId,
        supplied_token: &str,
    ) -> Result<bool, Error> {
        self.csrf.validate(session_id, supplied_token).await
    }

    // --- password reset ---------------------------------------------------

    /// Request a password reset. Succeeds with the same shape whether or
    /// not the email belongs to a user.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        self.reset.request_reset(email).await
    }

    /// Check a reset token without consuming it.
    pub async fn verify_reset_token(&self, token: &str) -> Result<bool, Error> {
        Ok(self.reset.validate(token).await?.is_some())
    }

    /// Redeem a reset token, setting a new password. Exactly-once: a second
    /// redemption of the same token fails with
    /// [`AuthError::InvalidOrExpiredResetToken`].
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<UserId, Error> {
        self.reset.redeem(token, new_password).await
    }

    /// Delete expired reset tokens.
    pub async fn cleanup_expired_reset_tokens(&self) -> Result<u64, Error> {
        self.reset.cleanup_expired().await
    }
}
