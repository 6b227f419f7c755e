use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Expected authentication outcomes. All of these are user-facing and
/// non-fatal; callers render [`Error::user_message`] rather than the
/// variant itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The identifier or the password was wrong. Callers must never learn which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked")]
    AccountLocked,

    #[error("Account inactive")]
    AccountInactive,

    #[error("Captcha verification failed")]
    CaptchaFailed,

    #[error("Invalid request token")]
    InvalidCsrfToken,

    /// Covers missing, expired and already-redeemed reset tokens alike.
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredResetToken,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Weak password")]
    WeakPassword,

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// The message safe to show an end user.
    ///
    /// Storage failures are collapsed into a generic message (the detail
    /// belongs in the logs, not the response), and near-neighbour security
    /// failures share a single rendering so they are indistinguishable.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Auth(AuthError::InvalidCredentials) => "Invalid username or password.",
            Error::Auth(AuthError::AccountLocked) => {
                "Too many failed attempts. Please try again later."
            }
            Error::Auth(AuthError::AccountInactive) => "This account is not active.",
            Error::Auth(AuthError::CaptchaFailed) => "Captcha verification failed.",
            Error::Auth(AuthError::InvalidCsrfToken) => "Invalid request.",
            Error::Auth(AuthError::InvalidOrExpiredResetToken) => {
                "This reset link is invalid or has expired."
            }
            Error::Session(_) => "Your session has expired. Please sign in again.",
            Error::Storage(_) => "Something went wrong. Please try again.",
            Error::Validation(ValidationError::WeakPassword) => {
                "Password does not meet the minimum requirements."
            }
            Error::Validation(_) => "Invalid input.",
        }
    }
}
