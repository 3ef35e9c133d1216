//! In-memory [`LedgerStore`] for tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{
    AccountId, CardId, CreditId, PageRequest, ScheduleEntryId, TransactionId, UserId,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{LedgerStore, StoreError};
use crate::auth::{NewUser, User};
use crate::card::{NewCard, StoredCard};
use crate::credit::{Credit, NewCredit, NewScheduleEntry, ScheduleEntry};
use crate::ledger::{
    Account, AccountFlows, LedgerPosting, NewAccount, Transaction, TransactionFilter,
};

/// A thread-safe in-memory store.
///
/// All state sits behind one mutex, so every method is trivially serializable.
/// Vectors keep insertion order, which doubles as creation order.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    credits: Vec<Credit>,
    schedule: Vec<ScheduleEntry>,
    cards: Vec<StoredCard>,
    faults: Faults,
}

/// Failure switches flipped by unit tests; always off otherwise.
#[derive(Default)]
struct Faults {
    broken_credits: HashSet<CreditId>,
    stale_due_listing: bool,
    due_listing_down: bool,
}

impl State {
    fn account(&self, id: AccountId) -> Result<&Account, StoreError> {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, StoreError> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    fn entry_mut(&mut self, id: ScheduleEntryId) -> Result<&mut ScheduleEntry, StoreError> {
        self.schedule
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("payment schedule", id))
    }

    fn apply(&mut self, postings: Vec<LedgerPosting>) -> Result<Vec<Transaction>, StoreError> {
        // dry run first so a failing posting leaves every balance untouched
        let mut projected: HashMap<AccountId, Decimal> = HashMap::new();
        for posting in &postings {
            let current = match projected.get(&posting.account_id) {
                Some(balance) => *balance,
                None => self.account(posting.account_id)?.balance,
            };
            projected.insert(posting.account_id, posting.apply_to(current)?);
        }

        let now = Utc::now();
        let mut committed = Vec::with_capacity(postings.len());
        for posting in postings {
            let account = self.account_mut(posting.account_id)?;
            // replays the dry run, which already succeeded
            account.balance = posting.apply_to(account.balance)?;
            account.updated_at = now;
            let tx = Transaction {
                id: TransactionId::new(),
                account_id: posting.account_id,
                amount: posting.amount,
                kind: posting.kind,
                description: posting.description,
                balance_after: account.balance,
                created_at: now,
            };
            self.transactions.push(tx.clone());
            committed.push(tx);
        }
        Ok(committed)
    }
}

impl InMemoryLedgerStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every lookup of `credit_id` fail as if the store were down.
    #[cfg(test)]
    pub(crate) async fn break_credit(&self, credit_id: CreditId) {
        self.state.lock().await.faults.broken_credits.insert(credit_id);
    }

    /// Makes `list_due_entries` also return already-paid installments.
    #[cfg(test)]
    pub(crate) async fn serve_stale_due_listing(&self) {
        self.state.lock().await.faults.stale_due_listing = true;
    }

    /// Makes `list_due_entries` fail.
    #[cfg(test)]
    pub(crate) async fn take_due_listing_down(&self) {
        self.state.lock().await.faults.due_listing_down = true;
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        let user = User {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        if !state.users.iter().any(|u| u.id == account.user_id) {
            return Err(StoreError::not_found("user", account.user_id));
        }
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            user_id: account.user_id,
            balance: Decimal::ZERO,
            currency: account.currency,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.state.lock().await.account(id).cloned()
    }

    async fn find_account_owner(&self, id: AccountId) -> Result<UserId, StoreError> {
        Ok(self.state.lock().await.account(id)?.user_id)
    }

    async fn get_balance(&self, id: AccountId) -> Result<Decimal, StoreError> {
        Ok(self.state.lock().await.account(id)?.balance)
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn post(&self, postings: Vec<LedgerPosting>) -> Result<Vec<Transaction>, StoreError> {
        self.state.lock().await.apply(postings)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.lock().await;
        state.account(account_id)?;
        Ok(page.apply(
            state
                .transactions
                .iter()
                .rev()
                .filter(|tx| tx.account_id == account_id && filter.matches(tx))
                .cloned(),
        ))
    }

    async fn account_flows(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AccountFlows, StoreError> {
        let state = self.state.lock().await;
        state.account(account_id)?;
        let window = TransactionFilter {
            kind: None,
            from: Some(from),
            to: Some(to),
        };
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account_id && window.matches(tx))
            .fold(AccountFlows::default(), |mut flows, tx| {
                if tx.amount.is_sign_positive() {
                    flows.income += tx.amount;
                } else {
                    flows.expense -= tx.amount;
                }
                flows
            }))
    }

    async fn create_credit(
        &self,
        credit: NewCredit,
        schedule: Vec<NewScheduleEntry>,
    ) -> Result<(Credit, Vec<ScheduleEntry>), StoreError> {
        let mut state = self.state.lock().await;
        state.account(credit.account_id)?;

        let now = Utc::now();
        let credit = Credit {
            id: CreditId::new(),
            user_id: credit.user_id,
            account_id: credit.account_id,
            principal: credit.principal,
            interest_rate: credit.interest_rate,
            term_months: credit.term_months,
            integrity_tag: credit.integrity_tag,
            created_at: now,
        };
        let entries: Vec<ScheduleEntry> = schedule
            .into_iter()
            .map(|planned| ScheduleEntry {
                id: ScheduleEntryId::new(),
                credit_id: credit.id,
                due_date: planned.due_date,
                amount: planned.amount,
                penalty: Decimal::ZERO,
                paid: false,
                created_at: now,
                updated_at: now,
            })
            .collect();

        state.credits.push(credit.clone());
        state.schedule.extend(entries.iter().cloned());
        Ok((credit, entries))
    }

    async fn find_credit(&self, id: CreditId) -> Result<Credit, StoreError> {
        let state = self.state.lock().await;
        if state.faults.broken_credits.contains(&id) {
            return Err(StoreError::Unavailable(format!("credit {id} is unreadable")));
        }
        state
            .credits
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("credit", id))
    }

    async fn list_credits(&self, user_id: UserId) -> Result<Vec<Credit>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .credits
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_schedule(&self, credit_id: CreditId) -> Result<Vec<ScheduleEntry>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<ScheduleEntry> = state
            .schedule
            .iter()
            .filter(|e| e.credit_id == credit_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.due_date);
        Ok(entries)
    }

    async fn list_due_entries(&self, as_of: NaiveDate) -> Result<Vec<ScheduleEntry>, StoreError> {
        let state = self.state.lock().await;
        if state.faults.due_listing_down {
            return Err(StoreError::Unavailable("due listing failed".to_string()));
        }
        let include_paid = state.faults.stale_due_listing;

        let mut due: Vec<ScheduleEntry> = state
            .schedule
            .iter()
            .filter(|e| (include_paid || !e.paid) && e.due_date <= as_of)
            .cloned()
            .collect();
        due.sort_by_key(|e| (e.due_date, e.created_at));
        Ok(due)
    }

    async fn settle_installment(
        &self,
        entry_id: ScheduleEntryId,
        posting: LedgerPosting,
    ) -> Result<Transaction, StoreError> {
        let mut state = self.state.lock().await;
        if state.entry_mut(entry_id)?.paid {
            return Err(StoreError::AlreadySettled(entry_id));
        }

        let tx = state
            .apply(vec![posting])?
            .pop()
            .ok_or_else(|| StoreError::Unavailable("posting produced no entry".to_string()))?;

        let entry = state.entry_mut(entry_id)?;
        entry.paid = true;
        entry.updated_at = tx.created_at;
        Ok(tx)
    }

    async fn accrue_penalty(
        &self,
        entry_id: ScheduleEntryId,
        increment: Decimal,
    ) -> Result<ScheduleEntry, StoreError> {
        let mut state = self.state.lock().await;
        let entry = state.entry_mut(entry_id)?;
        if entry.paid {
            return Err(StoreError::AlreadySettled(entry_id));
        }
        entry.penalty += increment;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn create_card(&self, card: NewCard) -> Result<StoredCard, StoreError> {
        let mut state = self.state.lock().await;
        state.account(card.account_id)?;
        let card = StoredCard {
            id: CardId::new(),
            account_id: card.account_id,
            card_number_ciphertext: card.card_number_ciphertext,
            expiry_ciphertext: card.expiry_ciphertext,
            cvv_hash: card.cvv_hash,
            integrity_tag: card.integrity_tag,
            created_at: Utc::now(),
        };
        state.cards.push(card.clone());
        Ok(card)
    }

    async fn list_cards(
        &self,
        owner: UserId,
        account_id: Option<AccountId>,
        page: PageRequest,
    ) -> Result<Vec<StoredCard>, StoreError> {
        let state = self.state.lock().await;
        let owned: Vec<AccountId> = state
            .accounts
            .iter()
            .filter(|a| a.user_id == owner)
            .map(|a| a.id)
            .collect();
        Ok(page.apply(
            state
                .cards
                .iter()
                .rev()
                .filter(|c| owned.contains(&c.account_id))
                .filter(|c| account_id.is_none_or(|id| c.account_id == id))
                .cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;
    use ledgerline_shared::types::Currency;
    use rust_decimal_macros::dec;

    use crate::ledger::TransactionKind;

    async fn funded_account(store: &InMemoryLedgerStore, balance: Decimal) -> Account {
        let user = store
            .create_user(NewUser {
                username: "ivan".into(),
                email: format!("{}@example.com", UserId::new()),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let account = store
            .create_account(NewAccount {
                user_id: user.id,
                currency: Currency::Rub,
            })
            .await
            .unwrap();
        if !balance.is_zero() {
            store
                .post(vec![LedgerPosting::credit(
                    account.id,
                    balance,
                    TransactionKind::Deposit,
                    "seed",
                )])
                .await
                .unwrap();
        }
        account
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryLedgerStore::new();
        let new_user = || NewUser {
            username: "ivan".into(),
            email: "ivan@example.com".into(),
            password_hash: "hash".into(),
        };
        store.create_user(new_user()).await.unwrap();
        assert!(matches!(
            store.create_user(new_user()).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_post_is_all_or_nothing() {
        let store = InMemoryLedgerStore::new();
        let a = funded_account(&store, dec!(50)).await;
        let b = funded_account(&store, dec!(0)).await;

        let result = store
            .post(vec![
                LedgerPosting::credit(b.id, dec!(80), TransactionKind::TransferIn, "in"),
                LedgerPosting::debit(a.id, dec!(80), TransactionKind::TransferOut, "out"),
            ])
            .await;

        assert_eq!(
            result,
            Err(StoreError::InsufficientFunds {
                account_id: a.id,
                available: dec!(50)
            })
        );
        assert_eq!(store.get_balance(a.id).await.unwrap(), dec!(50));
        assert_eq!(store.get_balance(b.id).await.unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn test_balance_after_tracks_running_balance() {
        let store = InMemoryLedgerStore::new();
        let a = funded_account(&store, dec!(100)).await;

        let txs = store
            .post(vec![
                LedgerPosting::debit(a.id, dec!(30), TransactionKind::Withdrawal, "one"),
                LedgerPosting::debit(a.id, dec!(20), TransactionKind::Withdrawal, "two"),
            ])
            .await
            .unwrap();

        assert_eq!(txs[0].balance_after, dec!(70));
        assert_eq!(txs[1].balance_after, dec!(50));
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let missing = AccountId::new();
        assert!(matches!(
            store.get_balance(missing).await,
            Err(StoreError::NotFound { entity: "account", .. })
        ));
        assert!(matches!(
            store.find_account_owner(missing).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_settle_installment_once() {
        let store = InMemoryLedgerStore::new();
        let account = funded_account(&store, dec!(500)).await;
        let today = Utc::now().date_naive();

        let (credit, entries) = store
            .create_credit(
                NewCredit {
                    user_id: account.user_id,
                    account_id: account.id,
                    principal: dec!(300),
                    interest_rate: dec!(0),
                    term_months: 1,
                    integrity_tag: "tag".into(),
                },
                vec![NewScheduleEntry {
                    due_date: today,
                    amount: dec!(300),
                }],
            )
            .await
            .unwrap();
        let entry = &entries[0];
        assert_eq!(entry.credit_id, credit.id);

        let posting = || {
            LedgerPosting::debit(account.id, dec!(300), TransactionKind::CreditPayment, "pay")
        };
        let tx = store.settle_installment(entry.id, posting()).await.unwrap();
        assert_eq!(tx.balance_after, dec!(200));

        assert_eq!(
            store.settle_installment(entry.id, posting()).await,
            Err(StoreError::AlreadySettled(entry.id))
        );
        assert_eq!(store.get_balance(account.id).await.unwrap(), dec!(200));
        assert!(store.list_due_entries(today).await.unwrap().is_empty());
        assert_eq!(
            store.accrue_penalty(entry.id, dec!(1)).await,
            Err(StoreError::AlreadySettled(entry.id))
        );
    }

    #[tokio::test]
    async fn test_failed_settlement_leaves_entry_unpaid() {
        let store = InMemoryLedgerStore::new();
        let account = funded_account(&store, dec!(10)).await;
        let today = Utc::now().date_naive();
        let (_, entries) = store
            .create_credit(
                NewCredit {
                    user_id: account.user_id,
                    account_id: account.id,
                    principal: dec!(300),
                    interest_rate: dec!(0),
                    term_months: 1,
                    integrity_tag: "tag".into(),
                },
                vec![NewScheduleEntry {
                    due_date: today,
                    amount: dec!(300),
                }],
            )
            .await
            .unwrap();

        let result = store
            .settle_installment(
                entries[0].id,
                LedgerPosting::debit(account.id, dec!(300), TransactionKind::CreditPayment, "pay"),
            )
            .await;
        assert!(matches!(result, Err(StoreError::InsufficientFunds { .. })));
        assert_eq!(store.list_due_entries(today).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_due_entries_exclude_future_and_sort_oldest_first() {
        let store = InMemoryLedgerStore::new();
        let account = funded_account(&store, dec!(0)).await;
        let today = Utc::now().date_naive();
        let (_, _) = store
            .create_credit(
                NewCredit {
                    user_id: account.user_id,
                    account_id: account.id,
                    principal: dec!(300),
                    interest_rate: dec!(0),
                    term_months: 3,
                    integrity_tag: "tag".into(),
                },
                vec![
                    NewScheduleEntry {
                        due_date: today,
                        amount: dec!(100),
                    },
                    NewScheduleEntry {
                        due_date: today - Months::new(1),
                        amount: dec!(100),
                    },
                    NewScheduleEntry {
                        due_date: today + Months::new(1),
                        amount: dec!(100),
                    },
                ],
            )
            .await
            .unwrap();

        let due = store.list_due_entries(today).await.unwrap();
        assert_eq!(due.len(), 2);
        assert!(due[0].due_date < due[1].due_date);
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first_with_paging() {
        let store = InMemoryLedgerStore::new();
        let account = funded_account(&store, dec!(0)).await;
        for amount in [dec!(1), dec!(2), dec!(3)] {
            store
                .post(vec![LedgerPosting::credit(
                    account.id,
                    amount,
                    TransactionKind::Deposit,
                    "d",
                )])
                .await
                .unwrap();
        }

        let page = store
            .list_transactions(account.id, TransactionFilter::default(), PageRequest::new(2, 0))
            .await
            .unwrap();
        assert_eq!(
            page.iter().map(|t| t.amount).collect::<Vec<_>>(),
            vec![dec!(3), dec!(2)]
        );

        let rest = store
            .list_transactions(account.id, TransactionFilter::default(), PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].amount, dec!(1));
    }
}
