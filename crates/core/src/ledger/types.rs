//! Domain types for accounts and ledger entries.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, Currency, MAX_AMOUNT, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// A customer account. The balance only changes through ledger postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Current balance.
    pub balance: Decimal,
    /// Account currency.
    pub currency: Currency,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

/// Input for opening an account.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount {
    /// Owning user.
    pub user_id: UserId,
    /// Account currency.
    pub currency: Currency,
}

/// Classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money paid in.
    Deposit,
    /// Money paid out.
    Withdrawal,
    /// Incoming leg of a transfer.
    TransferIn,
    /// Outgoing leg of a transfer.
    TransferOut,
    /// Installment collected by settlement.
    CreditPayment,
}

impl TransactionKind {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::CreditPayment => "credit_payment",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer_in" => Ok(Self::TransferIn),
            "transfer_out" => Ok(Self::TransferOut),
            "credit_payment" => Ok(Self::CreditPayment),
            _ => Err(format!("Unknown transaction kind: {s}")),
        }
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Entry ID.
    pub id: TransactionId,
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Signed amount; negative for money leaving the account.
    pub amount: Decimal,
    /// Entry kind.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Account balance right after this entry.
    pub balance_after: Decimal,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

/// One balance change requested from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    /// Target account.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: Decimal,
    /// Entry kind.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Refuse the posting if it would take the balance below zero.
    pub require_funds: bool,
}

impl LedgerPosting {
    /// Money into `account_id`.
    pub fn credit(
        account_id: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            amount,
            kind,
            description: description.into(),
            require_funds: false,
        }
    }

    /// Money out of `account_id`, guarded by a funds check.
    pub fn debit(
        account_id: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            amount: -amount,
            kind,
            description: description.into(),
            require_funds: true,
        }
    }

    /// Balance after applying this posting to `balance`.
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` if a guarded debit would go below zero,
    /// `BalanceLimit` if the result leaves the storable range.
    pub fn apply_to(&self, balance: Decimal) -> Result<Decimal, StoreError> {
        let next = balance
            .checked_add(self.amount)
            .filter(|next| next.abs() <= MAX_AMOUNT)
            .ok_or(StoreError::BalanceLimit {
                account_id: self.account_id,
            })?;
        if self.require_funds && next < Decimal::ZERO {
            return Err(StoreError::InsufficientFunds {
                account_id: self.account_id,
                available: balance,
            });
        }
        Ok(next)
    }
}

/// Optional filters for transaction history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only entries of this kind.
    pub kind: Option<TransactionKind>,
    /// Entries at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Entries strictly before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Returns true if `tx` passes every set filter.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|kind| tx.kind == kind)
            && self.from.is_none_or(|from| tx.created_at >= from)
            && self.to.is_none_or(|to| tx.created_at < to)
    }
}

/// Both legs of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Outgoing leg on the source account.
    pub debit: Transaction,
    /// Incoming leg on the destination account.
    pub credit: Transaction,
}

/// Money in and out of one account over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlows {
    /// Sum of positive entries.
    pub income: Decimal,
    /// Sum of negative entries, as a positive number.
    pub expense: Decimal,
}
