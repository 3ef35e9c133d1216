//! One settlement pass.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerline_shared::types::round_money;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::credit::ScheduleEntry;
use crate::ledger::{LedgerError, LedgerService};
use crate::notify::{NotificationEvent, Notifier, notify_user};
use crate::store::{LedgerStore, StoreError};

/// Why a single installment could not be processed.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Ledger error while collecting.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Counts from one completed sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Due installments looked at.
    pub examined: usize,
    /// Installments collected.
    pub paid: usize,
    /// Installments that accrued a penalty.
    pub penalized: usize,
    /// Installments settled by someone else in the meantime.
    pub skipped: usize,
    /// Installments that hit an error; retried on the next sweep.
    pub failed: usize,
    /// The due listing itself failed, so nothing was examined.
    pub listing_failed: bool,
}

/// Result of [`SettlementService::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was running; nothing was touched.
    Skipped,
    /// The sweep ran to the end.
    Completed(SweepReport),
}

enum EntryOutcome {
    Paid,
    Penalized,
    Skipped,
}

/// Collects due installments.
pub struct SettlementService {
    store: Arc<dyn LedgerStore>,
    ledger: LedgerService,
    notifier: Arc<dyn Notifier>,
    penalty_rate: Decimal,
    running: Mutex<()>,
}

impl SettlementService {
    /// Creates a settlement service. `penalty_rate` is the fraction of the
    /// installment added on every sweep that finds it uncollectable.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        ledger: LedgerService,
        notifier: Arc<dyn Notifier>,
        penalty_rate: Decimal,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            penalty_rate,
            running: Mutex::new(()),
        }
    }

    /// Processes every unpaid installment due on or before `as_of`.
    ///
    /// At most one sweep runs at a time; a call that finds another in
    /// progress returns [`SweepOutcome::Skipped`] immediately. Each
    /// installment is handled in its own unit of work, so one failure never
    /// stops the rest.
    pub async fn sweep(&self, as_of: NaiveDate) -> SweepOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            warn!(%as_of, "Settlement sweep already running, skipping");
            return SweepOutcome::Skipped;
        };

        let mut report = SweepReport::default();
        let due = match self.store.list_due_entries(as_of).await {
            Ok(due) => due,
            Err(e) => {
                error!(%as_of, error = %e, "Failed to list due installments");
                report.listing_failed = true;
                return SweepOutcome::Completed(report);
            }
        };

        for entry in &due {
            report.examined += 1;
            match self.settle_entry(entry).await {
                Ok(EntryOutcome::Paid) => report.paid += 1,
                Ok(EntryOutcome::Penalized) => report.penalized += 1,
                Ok(EntryOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        entry_id = %entry.id,
                        credit_id = %entry.credit_id,
                        error = %e,
                        "Failed to settle installment"
                    );
                }
            }
        }

        info!(
            %as_of,
            examined = report.examined,
            paid = report.paid,
            penalized = report.penalized,
            skipped = report.skipped,
            failed = report.failed,
            "Settlement sweep completed"
        );
        SweepOutcome::Completed(report)
    }

    async fn settle_entry(&self, entry: &ScheduleEntry) -> Result<EntryOutcome, SettlementError> {
        let credit = self.store.find_credit(entry.credit_id).await?;
        let balance = self.store.get_balance(credit.account_id).await?;
        let total = entry.total_due();

        if balance >= total {
            match self
                .ledger
                .collect_installment(entry, credit.account_id, total)
                .await
            {
                Ok(_) => {
                    notify_user(
                        self.store.as_ref(),
                        self.notifier.as_ref(),
                        credit.user_id,
                        NotificationEvent::InstallmentPaid {
                            credit_id: credit.id,
                            amount: total,
                            due_date: entry.due_date,
                        },
                    )
                    .await;
                    return Ok(EntryOutcome::Paid);
                }
                Err(LedgerError::AlreadySettled(_)) => return Ok(EntryOutcome::Skipped),
                // the balance moved between the read and the locked debit
                Err(LedgerError::InsufficientFunds { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let penalty = round_money(entry.amount * self.penalty_rate);
        match self.store.accrue_penalty(entry.id, penalty).await {
            Ok(updated) => {
                warn!(
                    entry_id = %entry.id,
                    credit_id = %credit.id,
                    %penalty,
                    total_penalty = %updated.penalty,
                    "Installment overdue, penalty added"
                );
                notify_user(
                    self.store.as_ref(),
                    self.notifier.as_ref(),
                    credit.user_id,
                    NotificationEvent::InstallmentOverdue {
                        credit_id: credit.id,
                        amount: entry.amount,
                        penalty,
                        due_date: entry.due_date,
                    },
                )
                .await;
                Ok(EntryOutcome::Penalized)
            }
            Err(StoreError::AlreadySettled(_)) => Ok(EntryOutcome::Skipped),
            Err(e) => Err(e.into()),
        }
    }
}
