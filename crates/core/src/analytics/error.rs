//! Analytics error types.

use chrono::{DateTime, Utc};
use ledgerline_shared::{AppError, types::AccountId};
use thiserror::Error;

use crate::principal::AccessDenied;
use crate::store::StoreError;

/// Errors from analytics queries.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Window end is not after its start.
    #[error("Invalid window: {from} is not before {to}")]
    InvalidWindow {
        /// Window start.
        from: DateTime<Utc>,
        /// Window end.
        to: DateTime<Utc>,
    },

    /// Forecast horizon outside 1 to 365 days.
    #[error("Forecast horizon must be 1 to 365 days, got {0}")]
    InvalidHorizon(u32),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account belongs to someone else.
    #[error("Account {0} does not belong to the caller")]
    Forbidden(AccountId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AnalyticsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWindow { .. } => "INVALID_WINDOW",
            Self::InvalidHorizon(_) => "INVALID_HORIZON",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidWindow { .. } | Self::InvalidHorizon(_) => 400,
            Self::AccountNotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Store(e) => AppError::from(e.clone()).status_code(),
        }
    }
}

impl From<AccessDenied> for AnalyticsError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotFound(id) => Self::AccountNotFound(id),
            AccessDenied::Forbidden(id) => Self::Forbidden(id),
            AccessDenied::Store(e) => Self::Store(e),
        }
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidWindow { .. } | AnalyticsError::InvalidHorizon(_) => {
                Self::Validation(err.to_string())
            }
            AnalyticsError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            AnalyticsError::Forbidden(_) => {
                Self::Forbidden("resource does not belong to the caller".to_string())
            }
            AnalyticsError::Store(e) => e.into(),
        }
    }
}
