//! Account ledger and transaction processor.
//!
//! This module implements:
//! - Account opening and balance lookups
//! - Deposits, withdrawals and two-legged transfers
//! - Filtered, paginated transaction history
//! - Installment collection on behalf of settlement

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use error::LedgerError;
pub use service::{LedgerService, validate_amount};
pub use types::{
    Account, AccountFlows, LedgerPosting, NewAccount, Transaction, TransactionFilter,
    TransactionKind, TransferReceipt,
};
