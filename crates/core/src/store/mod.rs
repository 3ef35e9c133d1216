//! The ledger store port.
//!
//! Every method is a complete unit of work: either everything it describes
//! commits or nothing does. Implementations must serialize concurrent
//! postings per account (row locks in PostgreSQL, a mutex in memory).

mod error;
mod memory;

pub use error::StoreError;
pub use memory::InMemoryLedgerStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{
    AccountId, CreditId, PageRequest, ScheduleEntryId, UserId,
};
use rust_decimal::Decimal;

use crate::auth::{NewUser, User};
use crate::card::{NewCard, StoredCard};
use crate::credit::{Credit, NewCredit, NewScheduleEntry, ScheduleEntry};
use crate::ledger::{
    Account, AccountFlows, LedgerPosting, NewAccount, Transaction, TransactionFilter,
};

/// Persistence for users, accounts, ledger entries, credits and cards.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a user. A taken email is a `Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Loads a user by ID.
    async fn find_user(&self, id: UserId) -> Result<User, StoreError>;

    /// Loads a user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Opens an account with a zero balance.
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Loads an account.
    async fn find_account(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Returns the owner of an account.
    async fn find_account_owner(&self, id: AccountId) -> Result<UserId, StoreError>;

    /// Returns the current balance of an account.
    async fn get_balance(&self, id: AccountId) -> Result<Decimal, StoreError>;

    /// Lists a user's accounts, oldest first.
    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;

    /// Applies all postings atomically.
    ///
    /// Touched accounts are locked in ascending ID order. A posting with
    /// `require_funds` fails the whole batch with `InsufficientFunds` if it
    /// would take its account below zero. Entries are returned in posting order.
    async fn post(&self, postings: Vec<LedgerPosting>) -> Result<Vec<Transaction>, StoreError>;

    /// Lists an account's entries, newest first.
    async fn list_transactions(
        &self,
        account_id: AccountId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Sums money in and out of an account over `[from, to)`.
    async fn account_flows(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AccountFlows, StoreError>;

    /// Persists a credit and its whole schedule atomically.
    async fn create_credit(
        &self,
        credit: NewCredit,
        schedule: Vec<NewScheduleEntry>,
    ) -> Result<(Credit, Vec<ScheduleEntry>), StoreError>;

    /// Loads a credit.
    async fn find_credit(&self, id: CreditId) -> Result<Credit, StoreError>;

    /// Lists a user's credits, oldest first.
    async fn list_credits(&self, user_id: UserId) -> Result<Vec<Credit>, StoreError>;

    /// Lists a credit's installments by due date.
    async fn list_schedule(&self, credit_id: CreditId) -> Result<Vec<ScheduleEntry>, StoreError>;

    /// Unpaid installments due on or before `as_of`, oldest first.
    async fn list_due_entries(&self, as_of: NaiveDate) -> Result<Vec<ScheduleEntry>, StoreError>;

    /// Posts `posting` and marks the installment paid in one unit.
    ///
    /// Fails with `AlreadySettled` if the installment is already paid.
    async fn settle_installment(
        &self,
        entry_id: ScheduleEntryId,
        posting: LedgerPosting,
    ) -> Result<Transaction, StoreError>;

    /// Adds `increment` to an unpaid installment's penalty.
    async fn accrue_penalty(
        &self,
        entry_id: ScheduleEntryId,
        increment: Decimal,
    ) -> Result<ScheduleEntry, StoreError>;

    /// Persists a card.
    async fn create_card(&self, card: NewCard) -> Result<StoredCard, StoreError>;

    /// Lists cards on accounts owned by `owner`, newest first.
    async fn list_cards(
        &self,
        owner: UserId,
        account_id: Option<AccountId>,
        page: PageRequest,
    ) -> Result<Vec<StoredCard>, StoreError>;
}
