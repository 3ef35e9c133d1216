//! Property-based tests for LedgerService.
//!
//! - Amount validation accepts exactly the positive, cent-precise values
//! - Balance conservation: the balance always equals the sum of its entries
//! - No sequence of operations takes a balance below zero

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::service::{LedgerService, validate_amount};
use super::types::TransactionFilter;
use crate::notify::NoopNotifier;
use crate::store::{InMemoryLedgerStore, LedgerStore};
use crate::testing::{account, principal};
use ledgerline_shared::types::PageRequest;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        positive_amount().prop_map(Op::Deposit),
        positive_amount().prop_map(Op::Withdraw),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_cent_amounts_are_valid(amount in positive_amount()) {
        prop_assert!(validate_amount(amount).is_ok());
    }

    #[test]
    fn prop_sub_cent_amounts_are_rejected(mills in 1i64..10_000_000i64) {
        prop_assume!(mills % 10 != 0);
        let amount = Decimal::new(mills, 3);
        prop_assert!(matches!(validate_amount(amount), Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn prop_non_positive_amounts_are_rejected(cents in -1_000_000i64..=0i64) {
        prop_assert!(validate_amount(Decimal::new(cents, 2)).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_balance_equals_sum_of_entries(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = InMemoryLedgerStore::new();
            let ledger = LedgerService::new(Arc::new(store.clone()), Arc::new(NoopNotifier));
            let owner = principal(&store, "owner").await;
            let acc = account(&store, &owner, Decimal::ZERO).await;

            let mut expected = Decimal::ZERO;
            for op in ops {
                match op {
                    Op::Deposit(amount) => {
                        let tx = ledger.deposit(&owner, acc, amount).await.unwrap();
                        expected += amount;
                        assert_eq!(tx.balance_after, expected);
                    }
                    Op::Withdraw(amount) => match ledger.withdraw(&owner, acc, amount).await {
                        Ok(tx) => {
                            expected -= amount;
                            assert_eq!(tx.balance_after, expected);
                        }
                        Err(LedgerError::InsufficientFunds { available, .. }) => {
                            assert!(amount > expected);
                            assert_eq!(available, expected);
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    },
                }
                assert!(expected >= Decimal::ZERO);
            }

            let balance = store.get_balance(acc).await.unwrap();
            assert_eq!(balance, expected);

            let entries = store
                .list_transactions(acc, TransactionFilter::default(), PageRequest::new(100, 0))
                .await
                .unwrap();
            let sum: Decimal = entries.iter().map(|t| t.amount).sum();
            assert_eq!(sum, balance);
        });
    }
}
