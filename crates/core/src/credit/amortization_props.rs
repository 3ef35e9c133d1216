//! Property-based tests for the amortization engine.
//!
//! - Schedule length equals the term and due dates strictly increase
//! - Installments repay at least the principal, less rounding
//! - A higher rate never lowers the installment

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::amortization::{annuity_payment, build_schedule};

/// Principal from 1,000.00 to 10,000,000.00, large enough for a non-zero
/// installment over any term.
fn principal() -> impl Strategy<Value = Decimal> {
    (100_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Annual rate from 0.00% to 60.00%.
fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..=6_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn issue_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_schedule_shape(
        principal in principal(),
        rate in rate(),
        term in 1u32..=360,
        issued_on in issue_date(),
    ) {
        let schedule = build_schedule(principal, rate, term, issued_on).unwrap();
        prop_assert_eq!(schedule.len(), term as usize);
        prop_assert!(schedule[0].due_date > issued_on);
        for pair in schedule.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
            prop_assert_eq!(pair[0].amount, pair[1].amount);
        }
    }

    #[test]
    fn prop_installments_cover_principal(
        principal in principal(),
        rate in rate(),
        term in 1u32..=360,
    ) {
        let installment = annuity_payment(principal, rate, term).unwrap();
        let n = Decimal::from(term);
        // each installment may be rounded down by at most half a cent
        let rounding_slack = Decimal::new(5, 3) * n;
        prop_assert!(installment * n + rounding_slack >= principal);
        prop_assert!(installment.scale() <= 2);
    }

    #[test]
    fn prop_rate_is_monotonic(
        principal in principal(),
        low in rate(),
        bump in 1i64..1_000i64,
        term in 1u32..=360,
    ) {
        let high = low + Decimal::new(bump, 2);
        let a = annuity_payment(principal, low, term).unwrap();
        let b = annuity_payment(principal, high, term).unwrap();
        prop_assert!(b >= a);
    }
}
