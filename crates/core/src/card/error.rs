//! Card error types.

use ledgerline_shared::{AppError, types::AccountId};
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::principal::AccessDenied;
use crate::store::StoreError;

/// Errors that can occur while issuing or reading cards.
#[derive(Debug, Error)]
pub enum CardError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account belongs to someone else.
    #[error("Account {0} does not belong to the caller")]
    Forbidden(AccountId),

    /// Generation, sealing or opening of card material failed.
    #[error("Card crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CardError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Crypto(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Crypto(
                CryptoError::DecryptFailed
                | CryptoError::InvalidHash
                | CryptoError::EncryptFailed
                | CryptoError::HashFailed(_),
            ) => 500,
            Self::Crypto(_) => 400,
            Self::Store(e) => AppError::from(e.clone()).status_code(),
        }
    }
}

impl From<AccessDenied> for CardError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotFound(id) => Self::AccountNotFound(id),
            AccessDenied::Forbidden(id) => Self::Forbidden(id),
            AccessDenied::Store(e) => Self::Store(e),
        }
    }
}

impl From<CardError> for AppError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            CardError::Forbidden(_) => {
                Self::Forbidden("resource does not belong to the caller".to_string())
            }
            CardError::Crypto(e) => e.into(),
            CardError::Store(e) => e.into(),
        }
    }
}
