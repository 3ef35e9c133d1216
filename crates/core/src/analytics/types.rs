//! Analytics report types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Money in and out of an account over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncomeExpenseStats {
    /// Sum of incoming entries.
    pub income: Decimal,
    /// Sum of outgoing entries, as a positive number.
    pub expense: Decimal,
    /// `income - expense`.
    pub net_balance: Decimal,
}

/// Monthly credit payments against the borrower's total balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditBurden {
    /// One installment per credit that is not yet repaid.
    pub monthly_payments: Decimal,
    /// Sum of all the borrower's account balances.
    pub total_balance: Decimal,
    /// `monthly_payments / total_balance`, 4 dp; zero without a positive balance.
    pub burden_ratio: Decimal,
}

/// Projected end-of-day balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceForecast {
    /// Balance the projection starts from.
    pub initial_balance: Decimal,
    /// Number of projected days.
    pub forecasted_days: u32,
    /// One entry per day, starting tomorrow.
    pub daily_forecast: Vec<DailyBalance>,
}

/// Projected balance at the end of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBalance {
    /// The day.
    pub date: NaiveDate,
    /// Balance after that day's installments.
    pub balance: Decimal,
}
