//! Plain-text email delivery for ledger notifications.

use async_trait::async_trait;
use ledgerline_core::notify::{Notification, NotificationEvent, Notifier, NotifyError};
use ledgerline_shared::{EmailError, EmailService};
use tracing::info;

const SIGNATURE: &str = "\nBest regards,\nLedgerline Bank";

/// [`Notifier`] that sends every notification through SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    email: EmailService,
}

impl EmailNotifier {
    /// Wraps an email service.
    #[must_use]
    pub const fn new(email: EmailService) -> Self {
        Self { email }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (subject, body) = render(notification);

        self.email
            .send_email(&notification.recipient.email, &subject, &body)
            .await
            .map_err(|e| match e {
                EmailError::InvalidAddress(msg) | EmailError::BuildError(msg) => {
                    NotifyError::Rejected(msg)
                }
                EmailError::SendError(msg) => NotifyError::Delivery(msg),
            })?;

        info!(
            event = notification.event.name(),
            subject = %subject,
            "Notification email sent"
        );
        Ok(())
    }
}

/// Renders the subject and body for a notification.
#[must_use]
pub fn render(notification: &Notification) -> (String, String) {
    let greeting = format!("Dear {},\n\n", notification.recipient.username);

    let (subject, text) = match &notification.event {
        NotificationEvent::Deposit {
            account_id,
            amount,
            balance,
        } => (
            "Deposit Notification",
            format!(
                "Your account {account_id} has been credited with {amount:.2}.\n\
                 Current balance: {balance:.2}\n"
            ),
        ),
        NotificationEvent::Withdrawal {
            account_id,
            amount,
            balance,
        } => (
            "Withdrawal Notification",
            format!(
                "An amount of {amount:.2} has been withdrawn from your account {account_id}.\n\
                 Current balance: {balance:.2}\n"
            ),
        ),
        NotificationEvent::TransferSent {
            from,
            to,
            amount,
            balance,
        } => (
            "Transfer Notification",
            format!(
                "You transferred {amount:.2} from account {from} to account {to}.\n\
                 Current balance: {balance:.2}\n"
            ),
        ),
        NotificationEvent::TransferReceived {
            from,
            to,
            amount,
            balance,
        } => (
            "Transfer Notification",
            format!(
                "Your account {to} received {amount:.2} from account {from}.\n\
                 Current balance: {balance:.2}\n"
            ),
        ),
        NotificationEvent::InstallmentPaid {
            credit_id,
            amount,
            due_date,
        } => (
            "Credit Payment Received",
            format!(
                "Your credit payment of {amount:.2} due on {due_date} for credit {credit_id} \
                 has been collected.\n"
            ),
        ),
        NotificationEvent::InstallmentOverdue {
            credit_id,
            amount,
            penalty,
            due_date,
        } => (
            "Overdue Credit Payment Notification",
            format!(
                "Your credit payment of {amount:.2} for credit {credit_id} was due on {due_date} \
                 and is now overdue.\n\
                 A penalty of {penalty:.2} has been applied.\n\
                 Please make the payment as soon as possible to avoid further penalties.\n"
            ),
        ),
    };

    (subject.to_string(), format!("{greeting}{text}{SIGNATURE}"))
}
