//! Ledger error types.
//!
//! Variants are listed in the order the checks run: amount, account
//! existence, ownership, then funds inside the store's atomic unit.

use ledgerline_shared::{
    AppError,
    types::{AccountId, ScheduleEntryId},
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::principal::AccessDenied;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be positive, at most [`MAX_AMOUNT`](ledgerline_shared::types::MAX_AMOUNT),
    /// with at most two decimal places.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Source and destination of a transfer are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account belongs to someone else.
    #[error("Account {0} does not belong to the caller")]
    Forbidden(AccountId),

    // ========== Funds Errors ==========
    /// The debit would take the balance below zero.
    #[error("Insufficient funds on account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The account that would be overdrawn.
        account_id: AccountId,
        /// Balance at the time of the check.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    // ========== Settlement Errors ==========
    /// The installment was already collected.
    #[error("Installment {0} is already settled")]
    AlreadySettled(ScheduleEntryId),

    // ========== Store Errors ==========
    /// Store error.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl LedgerError {
    /// Maps a store failure seen while posting `requested` against `account_id`.
    pub(crate) fn from_posting(err: StoreError, requested: Decimal) -> Self {
        match err {
            StoreError::InsufficientFunds {
                account_id,
                available,
            } => Self::InsufficientFunds {
                account_id,
                available,
                requested,
            },
            StoreError::AlreadySettled(id) => Self::AlreadySettled(id),
            StoreError::BalanceLimit { .. } => Self::InvalidAmount(requested),
            other => Self::Store(other),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AlreadySettled(_) => "ALREADY_SETTLED",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_) | Self::SameAccountTransfer => 400,

            // 403 Forbidden - ownership errors
            Self::Forbidden(_) => 403,

            // 404 Not Found
            Self::AccountNotFound(_) => 404,

            // 409 Conflict
            Self::AlreadySettled(_) => 409,

            // 422 Unprocessable - funds
            Self::InsufficientFunds { .. } => 422,

            Self::Store(e) => AppError::from(e.clone()).status_code(),
        }
    }
}

impl From<AccessDenied> for LedgerError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotFound(id) => Self::AccountNotFound(id),
            AccessDenied::Forbidden(id) => Self::Forbidden(id),
            AccessDenied::Store(e) => Self::Store(e),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(_) | LedgerError::SameAccountTransfer => {
                Self::Validation(err.to_string())
            }
            LedgerError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::Forbidden(_) => {
                Self::Forbidden("account does not belong to the caller".to_string())
            }
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(err.to_string()),
            LedgerError::AlreadySettled(_) => Self::Conflict(err.to_string()),
            LedgerError::Store(e) => e.into(),
        }
    }
}
