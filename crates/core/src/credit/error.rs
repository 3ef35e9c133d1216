//! Credit error types.

use ledgerline_shared::{
    AppError,
    types::{AccountId, CreditId},
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::principal::AccessDenied;
use crate::rates::RateError;
use crate::store::StoreError;

/// Errors that can occur while issuing or reading credits.
#[derive(Debug, Error)]
pub enum CreditError {
    /// Principal must be positive with at most two decimal places.
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(Decimal),

    /// Term must be between 1 and 360 months.
    #[error("Invalid term: {0} months")]
    InvalidTerm(u32),

    /// Rate is negative, too large to store, or overflows the growth factor.
    #[error("Interest rate out of range: {0}")]
    RateOutOfRange(Decimal),

    /// Funding account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Funding account belongs to someone else.
    #[error("Account {0} does not belong to the caller")]
    AccountForbidden(AccountId),

    /// Credit not found.
    #[error("Credit not found: {0}")]
    CreditNotFound(CreditId),

    /// Credit belongs to someone else.
    #[error("Credit {0} does not belong to the caller")]
    CreditForbidden(CreditId),

    /// The benchmark rate could not be fetched.
    #[error("Benchmark rate unavailable: {0}")]
    RateUnavailable(#[source] RateError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CreditError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPrincipal(_) => "INVALID_PRINCIPAL",
            Self::InvalidTerm(_) => "INVALID_TERM",
            Self::RateOutOfRange(_) => "RATE_OUT_OF_RANGE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CreditNotFound(_) => "CREDIT_NOT_FOUND",
            Self::AccountForbidden(_) | Self::CreditForbidden(_) => "FORBIDDEN",
            Self::RateUnavailable(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPrincipal(_) | Self::InvalidTerm(_) | Self::RateOutOfRange(_) => 400,
            Self::AccountForbidden(_) | Self::CreditForbidden(_) => 403,
            Self::AccountNotFound(_) | Self::CreditNotFound(_) => 404,
            Self::RateUnavailable(_) => 503,
            Self::Store(e) => AppError::from(e.clone()).status_code(),
        }
    }
}

impl From<AccessDenied> for CreditError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotFound(id) => Self::AccountNotFound(id),
            AccessDenied::Forbidden(id) => Self::AccountForbidden(id),
            AccessDenied::Store(e) => Self::Store(e),
        }
    }
}

impl From<CreditError> for AppError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::InvalidPrincipal(_)
            | CreditError::InvalidTerm(_)
            | CreditError::RateOutOfRange(_) => Self::Validation(err.to_string()),
            CreditError::AccountNotFound(_) | CreditError::CreditNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            CreditError::AccountForbidden(_) | CreditError::CreditForbidden(_) => {
                Self::Forbidden("resource does not belong to the caller".to_string())
            }
            CreditError::RateUnavailable(e) => e.into(),
            CreditError::Store(e) => e.into(),
        }
    }
}
