//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Currency, MAX_AMOUNT, has_cent_precision, round_money};
pub use pagination::PageRequest;
