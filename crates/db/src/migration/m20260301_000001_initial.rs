//! Initial database migration.
//!
//! Creates users, accounts, the transaction ledger, credits with their
//! payment schedules, and cards.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: USERS & ACCOUNTS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: CREDITS
        // ============================================================
        db.execute_unprepared(CREDITS_SQL).await?;
        db.execute_unprepared(PAYMENT_SCHEDULES_SQL).await?;

        // ============================================================
        // PART 4: CARDS
        // ============================================================
        db.execute_unprepared(CARDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
            DROP TABLE IF EXISTS cards CASCADE;
            DROP TABLE IF EXISTS payment_schedules CASCADE;
            DROP TABLE IF EXISTS credits CASCADE;
            DROP TABLE IF EXISTS transactions CASCADE;
            DROP TABLE IF EXISTS accounts CASCADE;
            DROP TABLE IF EXISTS users CASCADE;
            ",
        )
        .await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    username VARCHAR(50) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_users_email UNIQUE (email),
    CONSTRAINT chk_username_length CHECK (char_length(username) BETWEEN 1 AND 50)
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    currency VARCHAR(3) NOT NULL DEFAULT 'RUB',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_accounts_user ON accounts(user_id, created_at);
";

const TRANSACTIONS_SQL: &str = r"
-- Append-only: rows are never updated or deleted by the application
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    amount NUMERIC(15, 2) NOT NULL,
    kind VARCHAR(32) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    balance_after NUMERIC(15, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_kind CHECK (
        kind IN ('deposit', 'withdrawal', 'transfer_in', 'transfer_out', 'credit_payment')
    ),
    CONSTRAINT chk_amount_nonzero CHECK (amount <> 0)
);

-- History listings: newest first per account
CREATE INDEX idx_transactions_account_time ON transactions(account_id, created_at DESC, id DESC);
";

const CREDITS_SQL: &str = r"
CREATE TABLE credits (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    principal NUMERIC(15, 2) NOT NULL,
    interest_rate NUMERIC(7, 4) NOT NULL,
    term_months INTEGER NOT NULL,
    integrity_tag VARCHAR(64) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_principal_positive CHECK (principal > 0),
    CONSTRAINT chk_rate_nonnegative CHECK (interest_rate >= 0),
    CONSTRAINT chk_term_range CHECK (term_months BETWEEN 1 AND 360)
);

CREATE INDEX idx_credits_user ON credits(user_id, created_at);
";

const PAYMENT_SCHEDULES_SQL: &str = r"
CREATE TABLE payment_schedules (
    id UUID PRIMARY KEY,
    credit_id UUID NOT NULL REFERENCES credits(id) ON DELETE CASCADE,
    due_date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    penalty NUMERIC(15, 2) NOT NULL DEFAULT 0,
    paid BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_installment_positive CHECK (amount > 0),
    CONSTRAINT chk_penalty_nonnegative CHECK (penalty >= 0)
);

CREATE INDEX idx_payment_schedules_credit ON payment_schedules(credit_id, due_date);

-- Settlement sweeps only ever look at unpaid rows
CREATE INDEX idx_payment_schedules_due ON payment_schedules(due_date) WHERE NOT paid;
";

const CARDS_SQL: &str = r"
CREATE TABLE cards (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    card_number_ciphertext TEXT NOT NULL,
    expiry_ciphertext TEXT NOT NULL,
    cvv_hash TEXT NOT NULL,
    integrity_tag VARCHAR(64) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_cards_account ON cards(account_id, created_at DESC);
";
