//! Analytics queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use ledgerline_shared::types::AccountId;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::AnalyticsError;
use super::types::{BalanceForecast, CreditBurden, DailyBalance, IncomeExpenseStats};
use crate::Principal;
use crate::principal::authorize_account;
use crate::store::LedgerStore;

/// Longest forecast horizon, in days.
pub const MAX_FORECAST_DAYS: u32 = 365;

const RATIO_SCALE: u32 = 4;

/// Read-only reports over a user's accounts and credits.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn LedgerStore>,
}

impl AnalyticsService {
    /// Creates an analytics service.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Income and expense of one account over `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` unless `from < to`, and ownership errors for
    /// foreign or missing accounts.
    pub async fn income_expense(
        &self,
        principal: &Principal,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<IncomeExpenseStats, AnalyticsError> {
        if from >= to {
            return Err(AnalyticsError::InvalidWindow { from, to });
        }
        authorize_account(self.store.as_ref(), principal, account_id).await?;

        let flows = self.store.account_flows(account_id, from, to).await?;
        Ok(IncomeExpenseStats {
            income: flows.income,
            expense: flows.expense,
            net_balance: flows.income - flows.expense,
        })
    }

    /// Monthly installments of outstanding credits against all balances.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the store cannot be read.
    pub async fn credit_burden(
        &self,
        principal: &Principal,
    ) -> Result<CreditBurden, AnalyticsError> {
        let total_balance: Decimal = self
            .store
            .list_accounts(principal.user_id)
            .await?
            .iter()
            .map(|a| a.balance)
            .sum();

        let mut monthly_payments = Decimal::ZERO;
        for credit in self.store.list_credits(principal.user_id).await? {
            let schedule = self.store.list_schedule(credit.id).await?;
            if let Some(next) = schedule.iter().find(|e| !e.paid) {
                monthly_payments += next.amount;
            }
        }

        let burden_ratio = if total_balance > Decimal::ZERO {
            (monthly_payments / total_balance)
                .round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        Ok(CreditBurden {
            monthly_payments,
            total_balance,
            burden_ratio,
        })
    }

    /// Projects the account balance for the next `days` days.
    ///
    /// Unpaid installments of credits funded by the account are subtracted,
    /// penalties included, on their due dates. Anything already overdue
    /// lands on the first projected day.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHorizon` unless `1 <= days <= 365`, and ownership
    /// errors for foreign or missing accounts.
    pub async fn balance_forecast(
        &self,
        principal: &Principal,
        account_id: AccountId,
        days: u32,
    ) -> Result<BalanceForecast, AnalyticsError> {
        self.forecast_from(principal, account_id, days, Utc::now().date_naive())
            .await
    }

    pub(super) async fn forecast_from(
        &self,
        principal: &Principal,
        account_id: AccountId,
        days: u32,
        today: NaiveDate,
    ) -> Result<BalanceForecast, AnalyticsError> {
        if days == 0 || days > MAX_FORECAST_DAYS {
            return Err(AnalyticsError::InvalidHorizon(days));
        }
        authorize_account(self.store.as_ref(), principal, account_id).await?;

        let initial_balance = self.store.get_balance(account_id).await?;
        let first_day = today + Days::new(1);

        // outflow per day; overdue installments fold into the first day
        let mut outflows: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for credit in self.store.list_credits(principal.user_id).await? {
            if credit.account_id != account_id {
                continue;
            }
            for entry in self.store.list_schedule(credit.id).await? {
                if entry.paid {
                    continue;
                }
                let day = entry.due_date.max(first_day);
                *outflows.entry(day).or_default() += entry.total_due();
            }
        }

        let mut balance = initial_balance;
        let daily_forecast = (1..=u64::from(days))
            .map(|offset| {
                let date = today + Days::new(offset);
                if let Some(out) = outflows.get(&date) {
                    balance -= *out;
                }
                DailyBalance { date, balance }
            })
            .collect();

        Ok(BalanceForecast {
            initial_balance,
            forecasted_days: days,
            daily_forecast,
        })
    }
}
