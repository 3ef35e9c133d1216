//! Row to domain conversions.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use ledgerline_core::{
    auth::User,
    card::StoredCard,
    credit::{Credit, ScheduleEntry},
    ledger::{Account, Transaction, TransactionKind},
    store::StoreError,
};
use ledgerline_shared::types::{
    AccountId, CardId, CreditId, Currency, ScheduleEntryId, TransactionId, UserId,
};

use crate::entities::{accounts, cards, credits, payment_schedules, transactions, users};

pub(super) fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

fn corrupt(table: &str, id: impl std::fmt::Display, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("corrupt {table} row {id}: {detail}"))
}

impl From<users::Model> for User {
    fn from(row: users::Model) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: utc(row.created_at),
        }
    }
}

impl TryFrom<accounts::Model> for Account {
    type Error = StoreError;

    fn try_from(row: accounts::Model) -> Result<Self, Self::Error> {
        let currency =
            Currency::from_str(&row.currency).map_err(|e| corrupt("accounts", row.id, e))?;
        Ok(Self {
            id: AccountId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            balance: row.balance,
            currency,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }
}

impl TryFrom<transactions::Model> for Transaction {
    type Error = StoreError;

    fn try_from(row: transactions::Model) -> Result<Self, Self::Error> {
        let kind = TransactionKind::from_str(&row.kind)
            .map_err(|e| corrupt("transactions", row.id, e))?;
        Ok(Self {
            id: TransactionId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            amount: row.amount,
            kind,
            description: row.description,
            balance_after: row.balance_after,
            created_at: utc(row.created_at),
        })
    }
}

impl TryFrom<credits::Model> for Credit {
    type Error = StoreError;

    fn try_from(row: credits::Model) -> Result<Self, Self::Error> {
        let term_months =
            u32::try_from(row.term_months).map_err(|e| corrupt("credits", row.id, e))?;
        Ok(Self {
            id: CreditId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            account_id: AccountId::from_uuid(row.account_id),
            principal: row.principal,
            interest_rate: row.interest_rate,
            term_months,
            integrity_tag: row.integrity_tag,
            created_at: utc(row.created_at),
        })
    }
}

impl From<payment_schedules::Model> for ScheduleEntry {
    fn from(row: payment_schedules::Model) -> Self {
        Self {
            id: ScheduleEntryId::from_uuid(row.id),
            credit_id: CreditId::from_uuid(row.credit_id),
            due_date: row.due_date,
            amount: row.amount,
            penalty: row.penalty,
            paid: row.paid,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        }
    }
}

impl From<cards::Model> for StoredCard {
    fn from(row: cards::Model) -> Self {
        Self {
            id: CardId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            card_number_ciphertext: row.card_number_ciphertext,
            expiry_ciphertext: row.expiry_ciphertext,
            cvv_hash: row.cvv_hash,
            integrity_tag: row.integrity_tag,
            created_at: utc(row.created_at),
        }
    }
}
