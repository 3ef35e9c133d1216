use std::sync::Arc;

use ledgerline_shared::types::{AccountId, Currency, MAX_AMOUNT, PageRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::notify::{NoopNotifier, NotificationEvent};
use crate::store::{InMemoryLedgerStore, LedgerStore};
use crate::testing::{FailingNotifier, RecordingNotifier, account, principal};

fn service(store: &InMemoryLedgerStore, notifier: RecordingNotifier) -> LedgerService {
    LedgerService::new(Arc::new(store.clone()), Arc::new(notifier))
}

#[tokio::test]
async fn test_open_account_starts_at_zero() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;

    let opened = ledger.open_account(&alice, Currency::Usd).await.unwrap();
    assert_eq!(opened.balance, dec!(0));
    assert_eq!(opened.currency, Currency::Usd);
    assert_eq!(ledger.list_accounts(&alice).await.unwrap(), vec![opened]);
}

#[tokio::test]
async fn test_deposit_then_withdraw() {
    let store = InMemoryLedgerStore::new();
    let notifier = RecordingNotifier::default();
    let ledger = service(&store, notifier.clone());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let tx = ledger.deposit(&alice, acc, dec!(100.00)).await.unwrap();
    assert_eq!(tx.kind, TransactionKind::Deposit);
    assert_eq!(tx.amount, dec!(100.00));
    assert_eq!(tx.balance_after, dec!(100.00));

    let tx = ledger.withdraw(&alice, acc, dec!(40.25)).await.unwrap();
    assert_eq!(tx.kind, TransactionKind::Withdrawal);
    assert_eq!(tx.amount, dec!(-40.25));
    assert_eq!(tx.balance_after, dec!(59.75));

    assert_eq!(ledger.balance(&alice, acc).await.unwrap(), dec!(59.75));
    assert_eq!(
        notifier.events().await,
        vec![
            NotificationEvent::Deposit {
                account_id: acc,
                amount: dec!(100.00),
                balance: dec!(100.00),
            },
            NotificationEvent::Withdrawal {
                account_id: acc,
                amount: dec!(40.25),
                balance: dec!(59.75),
            },
        ]
    );
}

#[tokio::test]
async fn test_withdraw_insufficient_funds_changes_nothing() {
    let store = InMemoryLedgerStore::new();
    let notifier = RecordingNotifier::default();
    let ledger = service(&store, notifier.clone());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(50)).await;

    let err = ledger.withdraw(&alice, acc, dec!(80)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds { account_id, available, requested }
            if account_id == acc && available == dec!(50) && requested == dec!(80)
    ));
    assert_eq!(store.get_balance(acc).await.unwrap(), dec!(50));
    assert!(notifier.events().await.is_empty());
}

#[tokio::test]
async fn test_withdraw_entire_balance() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(50)).await;

    let tx = ledger.withdraw(&alice, acc, dec!(50)).await.unwrap();
    assert_eq!(tx.balance_after, dec!(0));
}

#[tokio::test]
async fn test_amounts_are_bounded_by_storable_balance() {
    let store = InMemoryLedgerStore::new();
    let notifier = RecordingNotifier::default();
    let ledger = service(&store, notifier.clone());
    let alice = principal(&store, "alice").await;
    let full = account(&store, &alice, dec!(0)).await;
    let other = account(&store, &alice, dec!(100)).await;

    assert!(matches!(
        ledger.deposit(&alice, full, Decimal::MAX).await,
        Err(LedgerError::InvalidAmount(_))
    ));

    ledger.deposit(&alice, full, MAX_AMOUNT).await.unwrap();
    let err = ledger.deposit(&alice, full, dec!(1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(a) if a == dec!(1)));
    assert!(matches!(
        ledgerline_shared::AppError::from(err),
        ledgerline_shared::AppError::Validation(_)
    ));

    // the debit leg is rolled back with the refused credit leg
    assert!(matches!(
        ledger.transfer(&alice, other, full, dec!(50)).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert_eq!(store.get_balance(full).await.unwrap(), MAX_AMOUNT);
    assert_eq!(store.get_balance(other).await.unwrap(), dec!(100));
    assert_eq!(notifier.events().await.len(), 1);
}

#[tokio::test]
async fn test_validation_order() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;
    let bob = principal(&store, "bob").await;
    let bobs = account(&store, &bob, dec!(10)).await;
    let missing = AccountId::new();

    // amount is checked before the account
    assert!(matches!(
        ledger.deposit(&alice, missing, dec!(0)).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    // existence before ownership
    assert!(matches!(
        ledger.deposit(&alice, missing, dec!(1)).await,
        Err(LedgerError::AccountNotFound(id)) if id == missing
    ));
    // ownership before funds
    assert!(matches!(
        ledger.withdraw(&alice, bobs, dec!(1000)).await,
        Err(LedgerError::Forbidden(id)) if id == bobs
    ));
    assert!(matches!(
        ledger.balance(&alice, bobs).await,
        Err(LedgerError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_rejects_malformed_amounts() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(10)).await;

    for amount in [dec!(0), dec!(-5), dec!(0.001), dec!(10.555)] {
        assert!(matches!(
            ledger.deposit(&alice, acc, amount).await,
            Err(LedgerError::InvalidAmount(a)) if a == amount
        ));
    }
}

#[tokio::test]
async fn test_transfer_moves_money_and_notifies_both_sides() {
    let store = InMemoryLedgerStore::new();
    let notifier = RecordingNotifier::default();
    let ledger = service(&store, notifier.clone());
    let alice = principal(&store, "alice").await;
    let bob = principal(&store, "bob").await;
    let from = account(&store, &alice, dec!(100)).await;
    let to = account(&store, &bob, dec!(5)).await;

    let receipt = ledger.transfer(&alice, from, to, dec!(30)).await.unwrap();
    assert_eq!(receipt.debit.kind, TransactionKind::TransferOut);
    assert_eq!(receipt.debit.amount, dec!(-30));
    assert_eq!(receipt.debit.balance_after, dec!(70));
    assert_eq!(receipt.credit.kind, TransactionKind::TransferIn);
    assert_eq!(receipt.credit.amount, dec!(30));
    assert_eq!(receipt.credit.balance_after, dec!(35));

    assert_eq!(
        notifier.recipients().await,
        vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
    );
}

#[tokio::test]
async fn test_transfer_failures_leave_both_balances() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;
    let bob = principal(&store, "bob").await;
    let from = account(&store, &alice, dec!(20)).await;
    let to = account(&store, &bob, dec!(0)).await;

    assert!(matches!(
        ledger.transfer(&alice, from, to, dec!(20.01)).await,
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert!(matches!(
        ledger.transfer(&alice, from, from, dec!(1)).await,
        Err(LedgerError::SameAccountTransfer)
    ));
    assert!(matches!(
        ledger.transfer(&alice, from, AccountId::new(), dec!(1)).await,
        Err(LedgerError::AccountNotFound(_))
    ));
    assert!(matches!(
        ledger.transfer(&bob, from, to, dec!(1)).await,
        Err(LedgerError::Forbidden(_))
    ));

    assert_eq!(store.get_balance(from).await.unwrap(), dec!(20));
    assert_eq!(store.get_balance(to).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_the_operation() {
    let store = InMemoryLedgerStore::new();
    let ledger = LedgerService::new(Arc::new(store.clone()), Arc::new(FailingNotifier));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    let tx = ledger.deposit(&alice, acc, dec!(15)).await.unwrap();
    assert_eq!(tx.balance_after, dec!(15));
}

#[tokio::test]
async fn test_list_transactions_filters_and_pages() {
    let store = InMemoryLedgerStore::new();
    let ledger = service(&store, RecordingNotifier::default());
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(0)).await;

    for i in 1..=15 {
        ledger.deposit(&alice, acc, rust_decimal::Decimal::from(i)).await.unwrap();
    }
    ledger.withdraw(&alice, acc, dec!(5)).await.unwrap();

    let first = ledger
        .list_transactions(&alice, acc, TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].kind, TransactionKind::Withdrawal);

    let withdrawals = ledger
        .list_transactions(
            &alice,
            acc,
            TransactionFilter {
                kind: Some(TransactionKind::Withdrawal),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(withdrawals.len(), 1);

    let oversized = ledger
        .list_transactions(&alice, acc, TransactionFilter::default(), PageRequest::new(1000, 0))
        .await
        .unwrap();
    assert_eq!(oversized.len(), 16);
}

#[tokio::test]
async fn test_concurrent_withdrawals_never_overdraw() {
    let store = InMemoryLedgerStore::new();
    let ledger = LedgerService::new(Arc::new(store.clone()), Arc::new(NoopNotifier));
    let alice = principal(&store, "alice").await;
    let acc = account(&store, &alice, dec!(100)).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.withdraw(&alice, acc, dec!(10)).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(store.get_balance(acc).await.unwrap(), dec!(0));
}
