//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, CreditId, Currency};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::Principal;
use crate::auth::NewUser;
use crate::credit::{NewCredit, NewScheduleEntry, ScheduleEntry};
use crate::ledger::{LedgerPosting, NewAccount, TransactionKind};
use crate::notify::{Notification, NotificationEvent, Notifier, NotifyError};
use crate::store::{InMemoryLedgerStore, LedgerStore};

/// Captures every notification it receives.
#[derive(Default, Clone)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub(crate) async fn events(&self) -> Vec<NotificationEvent> {
        self.sent.lock().await.iter().map(|n| n.event.clone()).collect()
    }

    pub(crate) async fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|n| n.recipient.email.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

/// Rejects every notification.
pub(crate) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp relay down".to_string()))
    }
}

/// Registers a user directly in the store.
pub(crate) async fn principal(store: &InMemoryLedgerStore, username: &str) -> Principal {
    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap();
    Principal::new(user.id)
}

/// Opens an account for `principal` and deposits `balance` into it.
pub(crate) async fn account(
    store: &InMemoryLedgerStore,
    principal: &Principal,
    balance: Decimal,
) -> AccountId {
    let account = store
        .create_account(NewAccount {
            user_id: principal.user_id,
            currency: Currency::Rub,
        })
        .await
        .unwrap();
    if !balance.is_zero() {
        store
            .post(vec![LedgerPosting::credit(
                account.id,
                balance,
                TransactionKind::Deposit,
                "opening balance",
            )])
            .await
            .unwrap();
    }
    account.id
}

/// Persists a credit whose installments fall on the given dates.
pub(crate) async fn credit_due(
    store: &InMemoryLedgerStore,
    borrower: &Principal,
    account_id: AccountId,
    installments: &[(NaiveDate, Decimal)],
) -> (CreditId, Vec<ScheduleEntry>) {
    let (credit, schedule) = store
        .create_credit(
            NewCredit {
                user_id: borrower.user_id,
                account_id,
                principal: installments.iter().map(|(_, amount)| *amount).sum(),
                interest_rate: Decimal::ZERO,
                term_months: u32::try_from(installments.len()).unwrap(),
                integrity_tag: "tag".to_string(),
            },
            installments
                .iter()
                .map(|&(due_date, amount)| NewScheduleEntry { due_date, amount })
                .collect(),
        )
        .await
        .unwrap();
    (credit.id, schedule)
}
