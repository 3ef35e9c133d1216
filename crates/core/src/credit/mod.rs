//! Credit issuance and annuity amortization.

pub mod amortization;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod amortization_props;
#[cfg(test)]
mod tests;

pub use amortization::{MAX_TERM_MONTHS, annuity_payment, build_schedule, monthly_rate};
pub use error::CreditError;
pub use service::CreditService;
pub use types::{
    Credit, IssueCreditInput, IssuedCredit, NewCredit, NewScheduleEntry, ScheduleEntry,
};
