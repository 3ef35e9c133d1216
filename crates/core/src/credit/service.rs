//! Credit issuance.

use std::sync::Arc;

use chrono::Utc;
use ledgerline_shared::types::{AccountId, CreditId, UserId};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use super::amortization::{build_schedule, validate_terms};
use super::error::CreditError;
use super::types::{Credit, IssueCreditInput, IssuedCredit, NewCredit, ScheduleEntry};
use crate::Principal;
use crate::crypto::IntegrityKey;
use crate::principal::authorize_account;
use crate::rates::RateProvider;
use crate::store::{LedgerStore, StoreError};

/// Scale the frozen annual rate is stored with.
const RATE_SCALE: u32 = 4;

/// Issues credits and exposes their schedules.
#[derive(Clone)]
pub struct CreditService {
    store: Arc<dyn LedgerStore>,
    rates: Arc<dyn RateProvider>,
    integrity: IntegrityKey,
    bank_margin: Decimal,
}

impl CreditService {
    /// Creates a credit service. `bank_margin` is added, in percentage
    /// points, to every benchmark rate.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        rates: Arc<dyn RateProvider>,
        integrity: IntegrityKey,
        bank_margin: Decimal,
    ) -> Self {
        Self {
            store,
            rates,
            integrity,
            bank_margin,
        }
    }

    /// Issues a credit at the current benchmark rate plus the bank margin.
    ///
    /// The rate provider is consulted exactly once and the result is frozen
    /// into the credit.
    ///
    /// # Errors
    ///
    /// Returns `CreditError` if the input is invalid, the account is missing
    /// or not the caller's, the rate cannot be fetched, or the store fails.
    pub async fn issue_credit(
        &self,
        principal: &Principal,
        input: IssueCreditInput,
    ) -> Result<IssuedCredit, CreditError> {
        // 1. Validate input
        validate_terms(input.principal, input.term_months)?;

        // 2. Check ownership
        authorize_account(self.store.as_ref(), principal, input.account_id).await?;

        // 3. Fetch the benchmark once and add the margin
        let benchmark = self
            .rates
            .current_rate()
            .await
            .map_err(CreditError::RateUnavailable)?;

        self.persist(principal, input, benchmark + self.bank_margin).await
    }

    /// Issues a credit at a caller-supplied annual rate, margin included.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`CreditService::issue_credit`], except
    /// that no rate lookup happens.
    pub async fn issue_credit_at_rate(
        &self,
        principal: &Principal,
        input: IssueCreditInput,
        annual_rate_percent: Decimal,
    ) -> Result<IssuedCredit, CreditError> {
        validate_terms(input.principal, input.term_months)?;
        authorize_account(self.store.as_ref(), principal, input.account_id).await?;
        self.persist(principal, input, annual_rate_percent).await
    }

    /// Lists the caller's credits.
    ///
    /// # Errors
    ///
    /// Returns `CreditError::Store` if the store fails.
    pub async fn list_credits(&self, principal: &Principal) -> Result<Vec<Credit>, CreditError> {
        Ok(self.store.list_credits(principal.user_id).await?)
    }

    /// Lists the installments of one of the caller's credits by due date.
    ///
    /// # Errors
    ///
    /// Returns `CreditNotFound` or `CreditForbidden` if the credit is missing
    /// or not the caller's.
    pub async fn list_schedule(
        &self,
        principal: &Principal,
        credit_id: CreditId,
    ) -> Result<Vec<ScheduleEntry>, CreditError> {
        let credit = self.store.find_credit(credit_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => CreditError::CreditNotFound(credit_id),
            other => CreditError::Store(other),
        })?;
        if credit.user_id != principal.user_id {
            return Err(CreditError::CreditForbidden(credit_id));
        }
        Ok(self.store.list_schedule(credit_id).await?)
    }

    /// Recomputes the integrity tag of a stored credit.
    #[must_use]
    pub fn verify_integrity(&self, credit: &Credit) -> bool {
        let fields = tag_fields(credit.user_id, credit.account_id, credit.principal);
        self.integrity
            .verify(&fields.each_ref().map(String::as_str), &credit.integrity_tag)
    }

    async fn persist(
        &self,
        principal: &Principal,
        input: IssueCreditInput,
        annual_rate_percent: Decimal,
    ) -> Result<IssuedCredit, CreditError> {
        // 4. Freeze the rate at storage precision, then amortize with it
        let rate = annual_rate_percent
            .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        let issued_on = Utc::now().date_naive();
        let schedule = build_schedule(input.principal, rate, input.term_months, issued_on)?;

        // 5. Tag borrower, account and principal
        let fields = tag_fields(principal.user_id, input.account_id, input.principal);
        let integrity_tag = self.integrity.tag(&fields.each_ref().map(String::as_str));

        // 6. Persist credit and schedule together
        let (credit, schedule) = self
            .store
            .create_credit(
                NewCredit {
                    user_id: principal.user_id,
                    account_id: input.account_id,
                    principal: input.principal,
                    interest_rate: rate,
                    term_months: input.term_months,
                    integrity_tag,
                },
                schedule,
            )
            .await?;

        info!(
            credit_id = %credit.id,
            account_id = %credit.account_id,
            principal = %credit.principal,
            rate = %credit.interest_rate,
            term_months = credit.term_months,
            "Credit issued"
        );
        Ok(IssuedCredit { credit, schedule })
    }
}

fn tag_fields(user_id: UserId, account_id: AccountId, principal: Decimal) -> [String; 3] {
    [
        user_id.to_string(),
        account_id.to_string(),
        format!("{principal:.2}"),
    ]
}
