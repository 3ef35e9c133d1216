//! Registration and login.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::error::AuthError;
use super::types::{NewUser, User};
use crate::Principal;
use crate::crypto::{CryptoError, hash_secret, verify_secret};
use crate::store::{LedgerStore, StoreError};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 50;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Registers users and checks their passwords.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn LedgerStore>,
}

impl UserService {
    /// Creates a user service.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Registers a user. Emails are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad username, email or password,
    /// and `EmailTaken` when the email is already registered.
    pub async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        let username = input.username.trim();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(AuthError::InvalidUsername);
        }
        let email = normalize_email(&input.email);
        if !is_plausible_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let password_hash = hash_secret(&input.password)?;
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks an email and password and returns the matching principal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let user = match self.store.find_user_by_email(&normalize_email(email)).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        match verify_secret(password, &user.password_hash) {
            Ok(true) => Ok(Principal::new(user.id)),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(CryptoError::InvalidHash) => {
                warn!(user_id = %user.id, "Stored password hash is unreadable");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
