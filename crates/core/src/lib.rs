//! Core business logic for Ledgerline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence, rate lookups and notifications are reached through ports
//! (`LedgerStore`, `RateProvider`, `Notifier`) that the outer crates implement.
//!
//! # Modules
//!
//! - `crypto` - Card number generation, AES-GCM sealing, HMAC tags, Argon2id secrets
//! - `store` - The ledger store port and an in-memory implementation
//! - `ledger` - Accounts, deposits, withdrawals and transfers
//! - `credit` - Annuity amortization and credit issuance
//! - `settlement` - Periodic collection of due installments
//! - `card` - Card tokenization
//! - `auth` - User registration and credential checks
//! - `analytics` - Income/expense, credit burden and balance forecasts

pub mod analytics;
pub mod auth;
pub mod card;
pub mod credit;
pub mod crypto;
pub mod ledger;
pub mod notify;
pub mod principal;
pub mod rates;
pub mod settlement;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use principal::Principal;
