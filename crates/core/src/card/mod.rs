//! Card tokenization.
//!
//! Card numbers and expiry dates are sealed with AES-GCM before they reach
//! the store. The CVV is only ever kept as an Argon2id hash, and an HMAC tag
//! over the plaintext triple lets a stored card be checked end to end.

mod error;
mod service;
mod types;


pub use error::CardError;
pub use service::CardService;
pub use types::{CardView, IssuedCard, NewCard, StoredCard};
