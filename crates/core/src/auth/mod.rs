//! User registration and password authentication.
//!
//! Passwords are hashed with Argon2id. Issuing and verifying session tokens
//! happens outside the core; a successful [`UserService::authenticate`]
//! yields the [`Principal`](crate::Principal) the other services take.

mod error;
mod service;
mod types;

pub use error::AuthError;
pub use service::{MAX_USERNAME_LEN, MIN_PASSWORD_LEN, RegisterInput, UserService};
pub use types::{NewUser, User};
