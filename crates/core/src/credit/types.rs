//! Domain types for credits and their repayment schedules.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, CreditId, ScheduleEntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An issued credit. The rate is frozen at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// Credit ID.
    pub id: CreditId,
    /// Borrower.
    pub user_id: UserId,
    /// Account installments are collected from.
    pub account_id: AccountId,
    /// Amount lent.
    pub principal: Decimal,
    /// Annual rate in percent, margin included.
    pub interest_rate: Decimal,
    /// Number of monthly installments.
    pub term_months: u32,
    /// HMAC over borrower, account and principal.
    pub integrity_tag: String,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a credit.
#[derive(Debug, Clone)]
pub struct NewCredit {
    /// Borrower.
    pub user_id: UserId,
    /// Funding account.
    pub account_id: AccountId,
    /// Amount lent.
    pub principal: Decimal,
    /// Annual rate in percent.
    pub interest_rate: Decimal,
    /// Number of monthly installments.
    pub term_months: u32,
    /// HMAC over borrower, account and principal.
    pub integrity_tag: String,
}

/// One installment of a credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Entry ID.
    pub id: ScheduleEntryId,
    /// Owning credit.
    pub credit_id: CreditId,
    /// Due date.
    pub due_date: NaiveDate,
    /// Installment amount.
    pub amount: Decimal,
    /// Penalty accrued while overdue.
    pub penalty: Decimal,
    /// Set once, when the installment is collected.
    pub paid: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Installment plus accrued penalty.
    #[must_use]
    pub fn total_due(&self) -> Decimal {
        self.amount + self.penalty
    }
}

/// A planned installment before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewScheduleEntry {
    /// Due date.
    pub due_date: NaiveDate,
    /// Installment amount.
    pub amount: Decimal,
}

/// Request to issue a credit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IssueCreditInput {
    /// Funding account, must belong to the caller.
    pub account_id: AccountId,
    /// Amount to lend.
    pub principal: Decimal,
    /// Term in months, 1 to 360.
    pub term_months: u32,
}

/// A persisted credit with its schedule.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCredit {
    /// The credit.
    pub credit: Credit,
    /// Installments ordered by due date.
    pub schedule: Vec<ScheduleEntry>,
}
