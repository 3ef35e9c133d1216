//! Settlement of due installments.
//!
//! A sweep collects every unpaid installment that is due, or adds a penalty
//! when the funding account cannot cover it. The scheduler runs sweeps on a
//! fixed interval until it is stopped.

mod scheduler;
mod sweep;


pub use scheduler::SettlementScheduler;
pub use sweep::{SettlementError, SettlementService, SweepOutcome, SweepReport};
