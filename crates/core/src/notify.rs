//! Post-commit notifications.
//!
//! Services call [`notify_user`] after a unit of work commits. Delivery is
//! best effort: failures are logged and never change the caller's result.

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, CreditId, UserId};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::store::LedgerStore;

/// Who a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Delivery address.
    pub email: String,
    /// Greeting name.
    pub username: String,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Money paid into an account.
    Deposit {
        /// Credited account.
        account_id: AccountId,
        /// Amount deposited.
        amount: Decimal,
        /// Balance after the deposit.
        balance: Decimal,
    },
    /// Money paid out of an account.
    Withdrawal {
        /// Debited account.
        account_id: AccountId,
        /// Amount withdrawn.
        amount: Decimal,
        /// Balance after the withdrawal.
        balance: Decimal,
    },
    /// Outgoing transfer, sent to the source owner.
    TransferSent {
        /// Source account.
        from: AccountId,
        /// Destination account.
        to: AccountId,
        /// Amount moved.
        amount: Decimal,
        /// Source balance after the transfer.
        balance: Decimal,
    },
    /// Incoming transfer, sent to the destination owner.
    TransferReceived {
        /// Source account.
        from: AccountId,
        /// Destination account.
        to: AccountId,
        /// Amount moved.
        amount: Decimal,
        /// Destination balance after the transfer.
        balance: Decimal,
    },
    /// An installment was collected.
    InstallmentPaid {
        /// Credit the installment belongs to.
        credit_id: CreditId,
        /// Amount collected, penalty included.
        amount: Decimal,
        /// Original due date.
        due_date: NaiveDate,
    },
    /// An installment could not be collected and a penalty was added.
    InstallmentOverdue {
        /// Credit the installment belongs to.
        credit_id: CreditId,
        /// Installment amount.
        amount: Decimal,
        /// Penalty added by this sweep.
        penalty: Decimal,
        /// Original due date.
        due_date: NaiveDate,
    },
}

impl NotificationEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::TransferSent { .. } => "transfer_sent",
            Self::TransferReceived { .. } => "transfer_received",
            Self::InstallmentPaid { .. } => "installment_paid",
            Self::InstallmentOverdue { .. } => "installment_overdue",
        }
    }
}

/// A rendered-ready notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Addressee.
    pub recipient: Recipient,
    /// Event details.
    pub event: NotificationEvent,
}

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be rendered or addressed.
    #[error("notification rejected: {0}")]
    Rejected(String),
    /// The transport failed.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification port.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Resolves `user_id` and delivers `event`. Failures are logged at warn.
pub async fn notify_user(
    store: &dyn LedgerStore,
    notifier: &dyn Notifier,
    user_id: UserId,
    event: NotificationEvent,
) {
    let user = match store.find_user(user_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(
                %user_id,
                event = event.name(),
                error = %e,
                "Notification recipient lookup failed"
            );
            return;
        }
    };

    let notification = Notification {
        recipient: Recipient {
            email: user.email,
            username: user.username,
        },
        event,
    };

    if let Err(e) = notifier.notify(&notification).await {
        warn!(
            %user_id,
            event = notification.event.name(),
            error = %e,
            "Notification delivery failed"
        );
    }
}
