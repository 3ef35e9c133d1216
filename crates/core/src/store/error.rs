//! Store error types.

use ledgerline_shared::{
    AppError,
    types::{AccountId, ScheduleEntryId},
};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by a [`LedgerStore`](super::LedgerStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind, e.g. `"account"`.
        entity: &'static str,
        /// Lookup key.
        id: String,
    },

    /// A guarded debit would take the balance below zero.
    #[error("insufficient funds on account {account_id}: available {available}")]
    InsufficientFunds {
        /// Account that would be overdrawn.
        account_id: AccountId,
        /// Balance at the time of the check.
        available: Decimal,
    },

    /// A posting would take the balance past [`MAX_AMOUNT`](ledgerline_shared::types::MAX_AMOUNT).
    #[error("balance limit exceeded on account {account_id}")]
    BalanceLimit {
        /// Account that would overflow.
        account_id: AccountId,
    },

    /// The installment was already collected.
    #[error("installment {0} is already settled")]
    AlreadySettled(ScheduleEntryId),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed or could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Builds a `NotFound` for `entity` keyed by `id`.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceLimit { .. } => "BALANCE_LIMIT",
            Self::AlreadySettled(_) => "ALREADY_SETTLED",
            Self::Conflict(_) => "CONFLICT",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => Self::NotFound(format!("{entity} not found")),
            StoreError::InsufficientFunds { .. } => {
                Self::InsufficientFunds("balance does not cover the debit".to_string())
            }
            StoreError::BalanceLimit { .. } => {
                Self::Validation("balance limit exceeded".to_string())
            }
            StoreError::AlreadySettled(_) => {
                Self::Conflict("installment is already settled".to_string())
            }
            StoreError::Conflict(_) => Self::Conflict("record already exists".to_string()),
            StoreError::Unavailable(_) => Self::Dependency("ledger store unavailable".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_details_are_not_exposed() {
        let app: AppError = StoreError::Unavailable("connection refused 10.0.0.5".into()).into();
        assert!(matches!(&app, AppError::Dependency(msg) if !msg.contains("10.0.0.5")));
    }

    #[test]
    fn test_conflict_detail_is_not_exposed() {
        let app: AppError =
            StoreError::Conflict("duplicate key value violates \"users_email_key\"".into()).into();
        assert!(matches!(&app, AppError::Conflict(msg) if !msg.contains("users_email_key")));
    }

    #[test]
    fn test_balance_limit_is_validation() {
        let app: AppError = StoreError::BalanceLimit {
            account_id: AccountId::new(),
        }
        .into();
        assert!(matches!(app, AppError::Validation(_)));
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("account", "abc");
        assert_eq!(err.to_string(), "account not found: abc");
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }
}
