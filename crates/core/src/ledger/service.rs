//! Ledger service for deposits, withdrawals and transfers.
//!
//! This service owns the business rules; the store owns atomicity. There is
//! no in-process balance cache: every funds check happens under the store's
//! row locks, so concurrent debits serialize per account.

use std::sync::Arc;

use ledgerline_shared::types::{AccountId, Currency, MAX_AMOUNT, PageRequest, has_cent_precision};
use rust_decimal::Decimal;
use tracing::info;

use super::error::LedgerError;
use super::types::{
    Account, LedgerPosting, NewAccount, Transaction, TransactionFilter, TransactionKind,
    TransferReceipt,
};
use crate::Principal;
use crate::credit::ScheduleEntry;
use crate::notify::{NotificationEvent, Notifier, notify_user};
use crate::principal::authorize_account;
use crate::store::{LedgerStore, StoreError};

/// Ledger service for account-level money movement.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl LedgerService {
    /// Creates a ledger service.
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Opens a zero-balance account for the caller.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the account cannot be created.
    pub async fn open_account(
        &self,
        principal: &Principal,
        currency: Currency,
    ) -> Result<Account, LedgerError> {
        let account = self
            .store
            .create_account(NewAccount {
                user_id: principal.user_id,
                currency,
            })
            .await?;
        info!(account_id = %account.id, user_id = %principal.user_id, %currency, "Account opened");
        Ok(account)
    }

    /// Lists the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the store fails.
    pub async fn list_accounts(&self, principal: &Principal) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.list_accounts(principal.user_id).await?)
    }

    /// Pays `amount` into one of the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the amount is invalid, the account does not
    /// exist or belongs to someone else, or the store fails.
    pub async fn deposit(
        &self,
        principal: &Principal,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        authorize_account(self.store.as_ref(), principal, account_id).await?;

        let tx = self
            .post_one(LedgerPosting::credit(
                account_id,
                amount,
                TransactionKind::Deposit,
                "Deposit",
            ))
            .await?;
        info!(%account_id, transaction_id = %tx.id, %amount, "Deposit posted");

        notify_user(
            self.store.as_ref(),
            self.notifier.as_ref(),
            principal.user_id,
            NotificationEvent::Deposit {
                account_id,
                amount,
                balance: tx.balance_after,
            },
        )
        .await;
        Ok(tx)
    }

    /// Takes `amount` out of one of the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientFunds` if the balance does not cover
    /// the amount, plus every error [`LedgerService::deposit`] can return.
    pub async fn withdraw(
        &self,
        principal: &Principal,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(amount)?;
        authorize_account(self.store.as_ref(), principal, account_id).await?;

        let tx = self
            .post_one(LedgerPosting::debit(
                account_id,
                amount,
                TransactionKind::Withdrawal,
                "Withdrawal",
            ))
            .await?;
        info!(%account_id, transaction_id = %tx.id, %amount, "Withdrawal posted");

        notify_user(
            self.store.as_ref(),
            self.notifier.as_ref(),
            principal.user_id,
            NotificationEvent::Withdrawal {
                account_id,
                amount,
                balance: tx.balance_after,
            },
        )
        .await;
        Ok(tx)
    }

    /// Moves `amount` from the caller's account to any existing account.
    ///
    /// Both legs commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::SameAccountTransfer` if `from == to`,
    /// `AccountNotFound` if either account is missing, `Forbidden` if the
    /// caller does not own `from`, and `InsufficientFunds` if `from` cannot
    /// cover the amount.
    pub async fn transfer(
        &self,
        principal: &Principal,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        // 1. Validate input
        validate_amount(amount)?;
        if from == to {
            return Err(LedgerError::SameAccountTransfer);
        }

        // 2. Source must be ours, destination only has to exist
        authorize_account(self.store.as_ref(), principal, from).await?;
        let recipient = self
            .store
            .find_account_owner(to)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => LedgerError::AccountNotFound(to),
                other => LedgerError::Store(other),
            })?;

        // 3. Post both legs in one unit
        let mut legs = self
            .store
            .post(vec![
                LedgerPosting::debit(
                    from,
                    amount,
                    TransactionKind::TransferOut,
                    format!("Transfer to {to}"),
                ),
                LedgerPosting::credit(
                    to,
                    amount,
                    TransactionKind::TransferIn,
                    format!("Transfer from {from}"),
                ),
            ])
            .await
            .map_err(|e| LedgerError::from_posting(e, amount))?
            .into_iter();

        let (Some(debit), Some(credit)) = (legs.next(), legs.next()) else {
            return Err(LedgerError::Store(StoreError::Unavailable(
                "transfer committed without both legs".to_string(),
            )));
        };
        info!(%from, %to, %amount, "Transfer posted");

        // 4. Notify both sides
        notify_user(
            self.store.as_ref(),
            self.notifier.as_ref(),
            principal.user_id,
            NotificationEvent::TransferSent {
                from,
                to,
                amount,
                balance: debit.balance_after,
            },
        )
        .await;
        notify_user(
            self.store.as_ref(),
            self.notifier.as_ref(),
            recipient,
            NotificationEvent::TransferReceived {
                from,
                to,
                amount,
                balance: credit.balance_after,
            },
        )
        .await;

        Ok(TransferReceipt { debit, credit })
    }

    /// Returns the balance of one of the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the account does not exist or is not the caller's.
    pub async fn balance(
        &self,
        principal: &Principal,
        account_id: AccountId,
    ) -> Result<Decimal, LedgerError> {
        authorize_account(self.store.as_ref(), principal, account_id).await?;
        Ok(self.store.get_balance(account_id).await?)
    }

    /// Lists entries of one of the caller's accounts, newest first.
    ///
    /// The page defaults to 10 entries and is capped at 100.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the account does not exist or is not the caller's.
    pub async fn list_transactions(
        &self,
        principal: &Principal,
        account_id: AccountId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, LedgerError> {
        authorize_account(self.store.as_ref(), principal, account_id).await?;
        Ok(self
            .store
            .list_transactions(account_id, filter, page.normalized())
            .await?)
    }

    /// Debits `total` for an installment and marks it paid, atomically.
    pub(crate) async fn collect_installment(
        &self,
        entry: &ScheduleEntry,
        account_id: AccountId,
        total: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let posting = LedgerPosting::debit(
            account_id,
            total,
            TransactionKind::CreditPayment,
            format!("Installment due {}", entry.due_date),
        );
        let tx = self
            .store
            .settle_installment(entry.id, posting)
            .await
            .map_err(|e| LedgerError::from_posting(e, total))?;
        info!(
            %account_id,
            entry_id = %entry.id,
            credit_id = %entry.credit_id,
            %total,
            "Installment collected"
        );
        Ok(tx)
    }

    async fn post_one(&self, posting: LedgerPosting) -> Result<Transaction, LedgerError> {
        let requested = posting.amount.abs();
        self.store
            .post(vec![posting])
            .await
            .map_err(|e| LedgerError::from_posting(e, requested))?
            .pop()
            .ok_or_else(|| {
                LedgerError::Store(StoreError::Unavailable(
                    "posting committed without an entry".to_string(),
                ))
            })
    }
}

/// Amounts must be positive, no larger than [`MAX_AMOUNT`] and have at most
/// two decimal places.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` otherwise.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || amount > MAX_AMOUNT || !has_cent_precision(amount) {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}
