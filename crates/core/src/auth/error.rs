//! Authentication error types.

use ledgerline_shared::AppError;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::store::StoreError;

/// Errors from registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username is empty or too long.
    #[error("Username must be 1 to 50 characters")]
    InvalidUsername,

    /// Email is not an address.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is too short.
    #[error("Password must be at least 8 characters")]
    WeakPassword,

    /// Email already registered.
    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password. The two are never told apart.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Hashing failed.
    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Crypto(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidUsername | Self::InvalidEmail | Self::WeakPassword => 400,
            Self::InvalidCredentials => 401,
            Self::EmailTaken => 409,
            Self::Crypto(_) => 500,
            Self::Store(e) => AppError::from(e.clone()).status_code(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidUsername | AuthError::InvalidEmail | AuthError::WeakPassword => {
                Self::Validation(err.to_string())
            }
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::Crypto(_) => Self::Internal("password hashing failed".to_string()),
            AuthError::Store(e) => e.into(),
        }
    }
}
