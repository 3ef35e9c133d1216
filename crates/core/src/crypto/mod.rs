//! Cryptographic helpers for card material and stored secrets.
//!
//! This module provides:
//! - Luhn-valid card number, expiry and CVV generation
//! - AES-GCM sealing of card fields with a 128/192/256-bit key
//! - HMAC-SHA256 integrity tags under a secret separate from the cipher key
//! - Argon2id hashing for passwords and CVVs

mod card_number;
mod cipher;
mod error;
mod integrity;
mod secret;

pub use card_number::{generate_card_number, generate_cvv, generate_expiry, luhn_valid};
pub use cipher::CardCipher;
pub use error::CryptoError;
pub use integrity::IntegrityKey;
pub use secret::{hash_secret, verify_secret};
