//! The authenticated caller.

use ledgerline_shared::types::{AccountId, UserId};
use serde::{Deserialize, Serialize};

use crate::store::{LedgerStore, StoreError};

/// An already-authenticated caller. Token verification happens outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The calling user.
    pub user_id: UserId,
}

impl Principal {
    /// Creates a principal for `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Why an account-scoped call was refused.
#[derive(Debug)]
pub enum AccessDenied {
    /// No such account.
    NotFound(AccountId),
    /// The account belongs to someone else.
    Forbidden(AccountId),
    /// Ownership could not be read.
    Store(StoreError),
}

/// Checks that `account_id` exists and belongs to `principal`.
pub(crate) async fn authorize_account(
    store: &dyn LedgerStore,
    principal: &Principal,
    account_id: AccountId,
) -> Result<(), AccessDenied> {
    match store.find_account_owner(account_id).await {
        Ok(owner) if owner == principal.user_id => Ok(()),
        Ok(_) => Err(AccessDenied::Forbidden(account_id)),
        Err(StoreError::NotFound { .. }) => Err(AccessDenied::NotFound(account_id)),
        Err(e) => Err(AccessDenied::Store(e)),
    }
}
