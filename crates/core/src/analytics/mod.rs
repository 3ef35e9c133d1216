//! Read-only account and credit analytics.

mod error;
mod service;
mod types;


pub use error::AnalyticsError;
pub use service::{AnalyticsService, MAX_FORECAST_DAYS};
pub use types::{BalanceForecast, CreditBurden, DailyBalance, IncomeExpenseStats};
