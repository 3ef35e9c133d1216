//! User records.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::UserId;
use serde::Serialize;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Argon2id PHC hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Argon2id PHC hash of the password.
    pub password_hash: String,
}
