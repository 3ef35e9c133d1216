//! Periodic settlement driver.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use super::sweep::{SettlementService, SweepOutcome};

/// Runs [`SettlementService::sweep`] every `period` on a background task.
///
/// The first sweep runs immediately. Ticks missed while a sweep overruns are
/// dropped, never queued.
pub struct SettlementScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SettlementScheduler {
    /// Spawns the scheduler task. Must be called inside a tokio runtime.
    pub fn start(service: Arc<SettlementService>, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_secs = period.as_secs(), "Settlement scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let today = Utc::now().date_naive();
                        if let SweepOutcome::Completed(report) = service.sweep(today).await {
                            if report.listing_failed {
                                error!(%today, "Settlement sweep could not list due installments");
                            }
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Settlement scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Signals the task and waits for any in-flight sweep to finish.
    pub async fn stop(self) {
        // a closed channel means the task already exited
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "Settlement scheduler task panicked");
        }
    }
}
