//! PostgreSQL implementation of the ledger store port.
//!
//! Every multi-row operation runs in one database transaction. Balance
//! changes lock the touched `accounts` rows with `SELECT ... FOR UPDATE` in
//! ascending ID order, and installment changes lock their
//! `payment_schedules` row, so concurrent postings serialize per row and
//! never deadlock.

mod convert;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_core::{
    auth::{NewUser, User},
    card::{NewCard, StoredCard},
    credit::{Credit, NewCredit, NewScheduleEntry, ScheduleEntry},
    ledger::{
        Account, AccountFlows, LedgerPosting, NewAccount, Transaction, TransactionFilter,
    },
    store::{LedgerStore, StoreError},
};
use ledgerline_shared::types::{
    AccountId, CardId, CreditId, PageRequest, ScheduleEntryId, TransactionId, UserId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr, Statement, TransactionTrait, Value,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{accounts, cards, credits, payment_schedules, transactions, users};

/// Maps a database error onto the store port's error kinds.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => {
            warn!(error = %err, "Database operation failed");
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Ledger store backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        self.db.begin().await.map_err(store_err)
    }
}

async fn commit(txn: DatabaseTransaction) -> Result<(), StoreError> {
    txn.commit().await.map_err(store_err)
}

/// Applies postings inside `txn`, all or nothing.
async fn apply_postings(
    txn: &DatabaseTransaction,
    postings: Vec<LedgerPosting>,
) -> Result<Vec<Transaction>, StoreError> {
    let mut ids: Vec<Uuid> = postings.iter().map(|p| p.account_id.into_inner()).collect();
    ids.sort_unstable();
    ids.dedup();

    let locked = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(store_err)?;
    let mut balances: HashMap<Uuid, Decimal> = locked.iter().map(|a| (a.id, a.balance)).collect();

    // check every posting before writing anything
    let mut running = Vec::with_capacity(postings.len());
    for posting in &postings {
        let balance = balances
            .get_mut(&posting.account_id.into_inner())
            .ok_or_else(|| StoreError::not_found("account", posting.account_id))?;
        let next = posting.apply_to(*balance)?;
        *balance = next;
        running.push(next);
    }

    let now = Utc::now().into();
    let mut committed = Vec::with_capacity(postings.len());
    for (posting, balance_after) in postings.into_iter().zip(running) {
        let row = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            account_id: Set(posting.account_id.into_inner()),
            amount: Set(posting.amount),
            kind: Set(posting.kind.as_str().to_string()),
            description: Set(posting.description),
            balance_after: Set(balance_after),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(store_err)?;
        committed.push(Transaction::try_from(row)?);
    }

    for (id, balance) in balances {
        accounts::ActiveModel {
            id: Unchanged(id),
            balance: Set(balance),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(txn)
        .await
        .map_err(store_err)?;
    }

    Ok(committed)
}

/// Locks one installment row for the rest of `txn`.
async fn lock_entry(
    txn: &DatabaseTransaction,
    entry_id: ScheduleEntryId,
) -> Result<payment_schedules::Model, StoreError> {
    let entry = payment_schedules::Entity::find_by_id(entry_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(store_err)?
        .ok_or_else(|| StoreError::not_found("payment schedule", entry_id))?;
    if entry.paid {
        return Err(StoreError::AlreadySettled(entry_id));
    }
    Ok(entry)
}

async fn require_account<C: ConnectionTrait>(
    conn: &C,
    id: AccountId,
) -> Result<accounts::Model, StoreError> {
    accounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(store_err)?
        .ok_or_else(|| StoreError::not_found("account", id))
}

#[derive(Debug, FromQueryResult)]
struct FlowsRow {
    income: Decimal,
    expense: Decimal,
}

const ACCOUNT_FLOWS_SQL: &str = r"
SELECT
    COALESCE(SUM(amount) FILTER (WHERE amount > 0), 0) AS income,
    COALESCE(-SUM(amount) FILTER (WHERE amount < 0), 0) AS expense
FROM transactions
WHERE account_id = $1 AND created_at >= $2 AND created_at < $3
";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;
        Ok(row.into())
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(User::from)
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(User::from)
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let now = Utc::now().into();
        let row = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            user_id: Set(account.user_id.into_inner()),
            balance: Set(Decimal::ZERO),
            currency: Set(account.currency.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;
        Account::try_from(row)
    }

    async fn find_account(&self, id: AccountId) -> Result<Account, StoreError> {
        Account::try_from(require_account(&self.db, id).await?)
    }

    async fn find_account_owner(&self, id: AccountId) -> Result<UserId, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .select_only()
            .column(accounts::Column::UserId)
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(UserId::from_uuid)
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn get_balance(&self, id: AccountId) -> Result<Decimal, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .select_only()
            .column(accounts::Column::Balance)
            .into_tuple::<Decimal>()
            .one(&self.db)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn post(&self, postings: Vec<LedgerPosting>) -> Result<Vec<Transaction>, StoreError> {
        let txn = self.begin().await?;
        let committed = apply_postings(&txn, postings).await?;
        commit(txn).await?;
        Ok(committed)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()));
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::CreatedAt.lt(to));
        }

        let page = page.normalized();
        query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn account_flows(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AccountFlows, StoreError> {
        require_account(&self.db, account_id).await?;

        let row = FlowsRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ACCOUNT_FLOWS_SQL,
            [
                Value::from(account_id.into_inner()),
                Value::from(from),
                Value::from(to),
            ],
        ))
        .one(&self.db)
        .await
        .map_err(store_err)?;

        Ok(row.map_or_else(AccountFlows::default, |r| AccountFlows {
            income: r.income,
            expense: r.expense,
        }))
    }

    async fn create_credit(
        &self,
        credit: NewCredit,
        schedule: Vec<NewScheduleEntry>,
    ) -> Result<(Credit, Vec<ScheduleEntry>), StoreError> {
        let term_months = i32::try_from(credit.term_months)
            .map_err(|e| StoreError::Unavailable(format!("term_months: {e}")))?;

        let txn = self.begin().await?;
        require_account(&txn, credit.account_id).await?;

        let now = Utc::now().into();
        let row = credits::ActiveModel {
            id: Set(CreditId::new().into_inner()),
            user_id: Set(credit.user_id.into_inner()),
            account_id: Set(credit.account_id.into_inner()),
            principal: Set(credit.principal),
            interest_rate: Set(credit.interest_rate),
            term_months: Set(term_months),
            integrity_tag: Set(credit.integrity_tag),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(store_err)?;

        let mut entries = Vec::with_capacity(schedule.len());
        for planned in schedule {
            let entry = payment_schedules::ActiveModel {
                id: Set(ScheduleEntryId::new().into_inner()),
                credit_id: Set(row.id),
                due_date: Set(planned.due_date),
                amount: Set(planned.amount),
                penalty: Set(Decimal::ZERO),
                paid: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(store_err)?;
            entries.push(ScheduleEntry::from(entry));
        }

        commit(txn).await?;
        Ok((Credit::try_from(row)?, entries))
    }

    async fn find_credit(&self, id: CreditId) -> Result<Credit, StoreError> {
        let row = credits::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError::not_found("credit", id))?;
        Credit::try_from(row)
    }

    async fn list_credits(&self, user_id: UserId) -> Result<Vec<Credit>, StoreError> {
        credits::Entity::find()
            .filter(credits::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(credits::Column::CreatedAt)
            .order_by_asc(credits::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(Credit::try_from)
            .collect()
    }

    async fn list_schedule(&self, credit_id: CreditId) -> Result<Vec<ScheduleEntry>, StoreError> {
        Ok(payment_schedules::Entity::find()
            .filter(payment_schedules::Column::CreditId.eq(credit_id.into_inner()))
            .order_by_asc(payment_schedules::Column::DueDate)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(ScheduleEntry::from)
            .collect())
    }

    async fn list_due_entries(&self, as_of: NaiveDate) -> Result<Vec<ScheduleEntry>, StoreError> {
        Ok(payment_schedules::Entity::find()
            .filter(payment_schedules::Column::Paid.eq(false))
            .filter(payment_schedules::Column::DueDate.lte(as_of))
            .order_by_asc(payment_schedules::Column::DueDate)
            .order_by_asc(payment_schedules::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(ScheduleEntry::from)
            .collect())
    }

    async fn settle_installment(
        &self,
        entry_id: ScheduleEntryId,
        posting: LedgerPosting,
    ) -> Result<Transaction, StoreError> {
        let txn = self.begin().await?;
        lock_entry(&txn, entry_id).await?;

        let tx = apply_postings(&txn, vec![posting])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Unavailable("posting produced no entry".to_string()))?;

        payment_schedules::ActiveModel {
            id: Unchanged(entry_id.into_inner()),
            paid: Set(true),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(store_err)?;

        commit(txn).await?;
        Ok(tx)
    }

    async fn accrue_penalty(
        &self,
        entry_id: ScheduleEntryId,
        increment: Decimal,
    ) -> Result<ScheduleEntry, StoreError> {
        let txn = self.begin().await?;
        let entry = lock_entry(&txn, entry_id).await?;

        let updated = payment_schedules::ActiveModel {
            id: Unchanged(entry.id),
            penalty: Set(entry.penalty + increment),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(store_err)?;

        commit(txn).await?;
        Ok(updated.into())
    }

    async fn create_card(&self, card: NewCard) -> Result<StoredCard, StoreError> {
        require_account(&self.db, card.account_id).await?;
        let row = cards::ActiveModel {
            id: Set(CardId::new().into_inner()),
            account_id: Set(card.account_id.into_inner()),
            card_number_ciphertext: Set(card.card_number_ciphertext),
            expiry_ciphertext: Set(card.expiry_ciphertext),
            cvv_hash: Set(card.cvv_hash),
            integrity_tag: Set(card.integrity_tag),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;
        Ok(row.into())
    }

    async fn list_cards(
        &self,
        owner: UserId,
        account_id: Option<AccountId>,
        page: PageRequest,
    ) -> Result<Vec<StoredCard>, StoreError> {
        let mut query = cards::Entity::find()
            .join(JoinType::InnerJoin, cards::Relation::Accounts.def())
            .filter(accounts::Column::UserId.eq(owner.into_inner()));
        if let Some(account_id) = account_id {
            query = query.filter(cards::Column::AccountId.eq(account_id.into_inner()));
        }

        let page = page.normalized();
        Ok(query
            .order_by_desc(cards::Column::CreatedAt)
            .order_by_desc(cards::Column::Id)
            .offset(page.offset)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(StoredCard::from)
            .collect())
    }
}
