//! Annuity amortization.
//!
//! Fixed-point throughout: the monthly rate and the compound growth factor
//! are `Decimal` with 28 significant digits, and only the installment is
//! rounded (to cents, half away from zero).

use chrono::{Months, NaiveDate};
use ledgerline_shared::types::{MAX_AMOUNT, has_cent_precision, round_money};
use rust_decimal::Decimal;

use super::error::CreditError;
use super::types::NewScheduleEntry;

/// Longest allowed term.
pub const MAX_TERM_MONTHS: u32 = 360;

/// Largest annual rate a credit can carry (fits `NUMERIC(7,4)`).
pub const MAX_ANNUAL_RATE: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 4);

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Converts an annual percentage into a monthly fraction: `rate / 100 / 12`.
#[must_use]
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR
}

/// Equal monthly installment for an annuity credit.
///
/// `installment = r * P / (1 - (1 + r)^-n)`, computed as
/// `r * P * g / (g - 1)` with `g = (1 + r)^n`. A zero rate gives `P / n`.
///
/// # Errors
///
/// Returns `CreditError::InvalidPrincipal`, `InvalidTerm` or
/// `RateOutOfRange` for inputs outside the accepted domain, or when the
/// growth factor does not fit in a `Decimal`. A principal too small to give
/// at least one cent per month is `InvalidPrincipal`.
pub fn annuity_payment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Decimal, CreditError> {
    validate_terms(principal, term_months)?;
    if annual_rate_percent.is_sign_negative() || annual_rate_percent > MAX_ANNUAL_RATE {
        return Err(CreditError::RateOutOfRange(annual_rate_percent));
    }

    let installment = round_money(unrounded_installment(
        principal,
        annual_rate_percent,
        term_months,
    )?);
    if installment.is_zero() {
        return Err(CreditError::InvalidPrincipal(principal));
    }
    Ok(installment)
}

fn unrounded_installment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Decimal, CreditError> {
    let n = Decimal::from(term_months);
    let r = monthly_rate(annual_rate_percent);
    if r.is_zero() {
        return Ok(principal / n);
    }

    let overflow = || CreditError::RateOutOfRange(annual_rate_percent);
    let growth = compound(Decimal::ONE + r, term_months).ok_or_else(overflow)?;
    let denominator = growth - Decimal::ONE;
    if denominator <= Decimal::ZERO {
        // r is below the precision of 1 + r
        return Ok(principal / n);
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(overflow)
}

/// Builds the full repayment schedule: `term_months` equal installments, the
/// k-th due `k` months after `issued_on`.
///
/// Due dates past the end of a shorter month clamp to its last day, so a
/// credit issued on Jan 31 is due Feb 28 (or 29), then Mar 31.
///
/// # Errors
///
/// Returns the same errors as [`annuity_payment`].
pub fn build_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
    issued_on: NaiveDate,
) -> Result<Vec<NewScheduleEntry>, CreditError> {
    let installment = annuity_payment(principal, annual_rate_percent, term_months)?;

    (1..=term_months)
        .map(|k| {
            issued_on
                .checked_add_months(Months::new(k))
                .map(|due_date| NewScheduleEntry {
                    due_date,
                    amount: installment,
                })
                .ok_or(CreditError::InvalidTerm(term_months))
        })
        .collect()
}

/// Principal must be positive, storable and cent-precise; term between 1 and 360.
pub(crate) fn validate_terms(principal: Decimal, term_months: u32) -> Result<(), CreditError> {
    if principal <= Decimal::ZERO || principal > MAX_AMOUNT || !has_cent_precision(principal) {
        return Err(CreditError::InvalidPrincipal(principal));
    }
    if term_months == 0 || term_months > MAX_TERM_MONTHS {
        return Err(CreditError::InvalidTerm(term_months));
    }
    Ok(())
}

fn compound(base: Decimal, exponent: u32) -> Option<Decimal> {
    // square-and-multiply keeps the number of roundings logarithmic in n
    let mut result = Decimal::ONE;
    let mut base = base;
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(result)
}
