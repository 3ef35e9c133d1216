//! Secret hashing with Argon2id.
//!
//! Used for user passwords and card CVVs. Only the PHC string is ever stored.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::CryptoError;

/// Hashes a secret using Argon2id.
///
/// # Errors
///
/// Returns `CryptoError::HashFailed` if hashing fails.
///
/// # Example
///
/// ```
/// use ledgerline_core::crypto::hash_secret;
///
/// let hash = hash_secret("123").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_secret(secret: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::HashFailed(e.to_string()))
}

/// Verifies a secret against a stored PHC hash.
///
/// # Errors
///
/// Returns `CryptoError::InvalidHash` if the hash format is invalid.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, CryptoError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| CryptoError::InvalidHash)?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(CryptoError::InvalidHash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_correct_and_wrong() {
        let hash = hash_secret("correct_password").unwrap();

        assert!(verify_secret("correct_password", &hash).unwrap());
        assert!(!verify_secret("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        // Same secret should produce different hashes (due to random salt)
        assert_ne!(hash_secret("042").unwrap(), hash_secret("042").unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_secret("password", "invalid_hash");
        assert!(matches!(result, Err(CryptoError::InvalidHash)));
    }
}
