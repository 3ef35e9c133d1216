//! Card records and the views handed to callers.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, CardId};
use serde::Serialize;

/// A card as persisted. Number and expiry are sealed; the CVV is hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCard {
    /// Card ID.
    pub id: CardId,
    /// Account the card draws on.
    pub account_id: AccountId,
    /// Sealed card number.
    pub card_number_ciphertext: String,
    /// Sealed `MM/YY` expiry.
    pub expiry_ciphertext: String,
    /// Argon2id PHC hash of the CVV.
    pub cvv_hash: String,
    /// HMAC over number, expiry and CVV.
    pub integrity_tag: String,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a card.
#[derive(Debug, Clone)]
pub struct NewCard {
    /// Account the card draws on.
    pub account_id: AccountId,
    /// Sealed card number.
    pub card_number_ciphertext: String,
    /// Sealed expiry.
    pub expiry_ciphertext: String,
    /// Argon2id hash of the CVV.
    pub cvv_hash: String,
    /// HMAC over number, expiry and CVV.
    pub integrity_tag: String,
}

/// Returned once, at issuance. The only place the CVV is ever visible.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCard {
    /// Card ID.
    pub id: CardId,
    /// Account the card draws on.
    pub account_id: AccountId,
    /// Plaintext card number.
    pub card_number: String,
    /// Plaintext expiry.
    pub expiry: String,
    /// Plaintext CVV.
    pub cvv: String,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}

/// A decrypted card for listings. Never carries the CVV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    /// Card ID.
    pub id: CardId,
    /// Account the card draws on.
    pub account_id: AccountId,
    /// Plaintext card number.
    pub card_number: String,
    /// Plaintext expiry.
    pub expiry: String,
    /// HMAC over number, expiry and CVV.
    pub integrity_tag: String,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}
