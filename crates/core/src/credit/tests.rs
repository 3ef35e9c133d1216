use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, Utc};
use ledgerline_shared::types::CreditId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use super::*;
use crate::crypto::IntegrityKey;
use crate::rates::{FixedRateProvider, RateError, RateProvider};
use crate::store::{InMemoryLedgerStore, LedgerStore};
use crate::testing::{account, principal};

/// Counts lookups so tests can assert the provider is hit once per issuance.
#[derive(Default)]
struct CountingRateProvider {
    calls: Mutex<u32>,
}

#[async_trait]
impl RateProvider for CountingRateProvider {
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        *self.calls.lock().await += 1;
        Ok(dec!(16.00))
    }
}

struct DownRateProvider;

#[async_trait]
impl RateProvider for DownRateProvider {
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        Err(RateError::Unavailable("connection refused".into()))
    }
}

fn service(store: &InMemoryLedgerStore, rates: Arc<dyn RateProvider>) -> CreditService {
    CreditService::new(
        Arc::new(store.clone()),
        rates,
        IntegrityKey::new("credit-integrity").unwrap(),
        dec!(5.00),
    )
}

#[tokio::test]
async fn test_issue_credit_adds_margin_once() {
    let store = InMemoryLedgerStore::new();
    let rates = Arc::new(CountingRateProvider::default());
    let credits = service(&store, rates.clone());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let issued = credits
        .issue_credit(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(120000),
                term_months: 12,
            },
        )
        .await
        .unwrap();

    assert_eq!(*rates.calls.lock().await, 1);
    assert_eq!(issued.credit.interest_rate, dec!(21.0000));
    assert_eq!(issued.credit.term_months, 12);
    assert_eq!(issued.schedule.len(), 12);
    assert_eq!(
        issued.schedule[0].amount,
        annuity_payment(dec!(120000), dec!(21), 12).unwrap()
    );
    assert!(issued.schedule.iter().all(|e| !e.paid && e.penalty.is_zero()));

    let today = Utc::now().date_naive();
    assert_eq!(issued.schedule[0].due_date, today + Months::new(1));
    assert!(credits.verify_integrity(&issued.credit));
}

#[tokio::test]
async fn test_issue_credit_at_rate() {
    let store = InMemoryLedgerStore::new();
    let credits = service(&store, Arc::new(DownRateProvider));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let issued = credits
        .issue_credit_at_rate(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(120000),
                term_months: 12,
            },
            dec!(10),
        )
        .await
        .unwrap();

    assert!(issued.schedule.iter().all(|e| e.amount == dec!(10549.91)));
    let persisted = store.list_schedule(issued.credit.id).await.unwrap();
    assert_eq!(persisted, issued.schedule);
}

#[tokio::test]
async fn test_rate_failure_persists_nothing() {
    let store = InMemoryLedgerStore::new();
    let credits = service(&store, Arc::new(DownRateProvider));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let err = credits
        .issue_credit(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(1000),
                term_months: 6,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CreditError::RateUnavailable(_)));
    assert!(credits.list_credits(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_principal_below_one_cent_per_month_is_rejected() {
    let store = InMemoryLedgerStore::new();
    let credits = service(&store, Arc::new(FixedRateProvider::new(dec!(16.00))));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let err = credits
        .issue_credit(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(0.01),
                term_months: 360,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CreditError::InvalidPrincipal(p) if p == dec!(0.01)));
    assert!(matches!(
        ledgerline_shared::AppError::from(err),
        ledgerline_shared::AppError::Validation(_)
    ));
    assert!(credits.list_credits(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_runs_before_ownership_and_rate() {
    let store = InMemoryLedgerStore::new();
    let rates = Arc::new(CountingRateProvider::default());
    let credits = service(&store, rates.clone());
    let alice = principal(&store, "alice").await;
    let bob = principal(&store, "bob").await;
    let bobs = account(&store, &bob, dec!(0)).await;

    let input = |principal, term_months| IssueCreditInput {
        account_id: bobs,
        principal,
        term_months,
    };

    assert!(matches!(
        credits.issue_credit(&alice, input(dec!(0), 12)).await,
        Err(CreditError::InvalidPrincipal(_))
    ));
    assert!(matches!(
        credits.issue_credit(&alice, input(dec!(1000), 0)).await,
        Err(CreditError::InvalidTerm(0))
    ));
    assert!(matches!(
        credits.issue_credit(&alice, input(dec!(1000), 361)).await,
        Err(CreditError::InvalidTerm(361))
    ));
    assert!(matches!(
        credits.issue_credit(&alice, input(dec!(1000), 12)).await,
        Err(CreditError::AccountForbidden(id)) if id == bobs
    ));
    assert_eq!(*rates.calls.lock().await, 0);
}

#[tokio::test]
async fn test_list_schedule_checks_owner() {
    let store = InMemoryLedgerStore::new();
    let credits = service(&store, Arc::new(FixedRateProvider::new(dec!(10))));
    let alice = principal(&store, "alice").await;
    let bob = principal(&store, "bob").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let issued = credits
        .issue_credit(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(5000),
                term_months: 24,
            },
        )
        .await
        .unwrap();

    let schedule = credits.list_schedule(&alice, issued.credit.id).await.unwrap();
    assert_eq!(schedule.len(), 24);
    assert!(schedule.windows(2).all(|w| w[0].due_date < w[1].due_date));

    assert!(matches!(
        credits.list_schedule(&bob, issued.credit.id).await,
        Err(CreditError::CreditForbidden(_))
    ));
    assert!(matches!(
        credits.list_schedule(&alice, CreditId::new()).await,
        Err(CreditError::CreditNotFound(_))
    ));
}

#[tokio::test]
async fn test_tampered_credit_fails_integrity() {
    let store = InMemoryLedgerStore::new();
    let credits = service(&store, Arc::new(FixedRateProvider::new(dec!(10))));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let mut credit = credits
        .issue_credit(
            &alice,
            IssueCreditInput {
                account_id: acc,
                principal: dec!(5000),
                term_months: 6,
            },
        )
        .await
        .unwrap()
        .credit;

    credit.principal = dec!(50);
    assert!(!credits.verify_integrity(&credit));
}
