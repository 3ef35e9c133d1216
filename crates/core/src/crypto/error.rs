//! Crypto error types.

use ledgerline_shared::AppError;
use thiserror::Error;

/// Errors raised by the crypto helpers.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AES keys must be 16, 24 or 32 bytes.
    #[error("encryption key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The key was not valid hex.
    #[error("encryption key is not valid hex")]
    InvalidKeyEncoding,

    /// The integrity secret was empty.
    #[error("integrity secret cannot be empty")]
    EmptySecret,

    /// Card number prefix is not numeric or leaves no room for the check digit.
    #[error("card prefix {prefix:?} cannot produce a {length}-digit number")]
    InvalidPrefix {
        /// Requested issuer prefix.
        prefix: String,
        /// Requested total length.
        length: usize,
    },

    /// Sealing failed.
    #[error("encryption failed")]
    EncryptFailed,

    /// Malformed ciphertext, wrong key, or tampered data.
    #[error("decryption failed")]
    DecryptFailed,

    /// Argon2 could not produce a hash.
    #[error("failed to hash secret: {0}")]
    HashFailed(String),

    /// The stored hash is not a PHC string.
    #[error("invalid secret hash format")]
    InvalidHash,
}

impl CryptoError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidKeyLength(_) => "INVALID_KEY_LENGTH",
            Self::InvalidKeyEncoding => "INVALID_KEY_ENCODING",
            Self::EmptySecret => "EMPTY_SECRET",
            Self::InvalidPrefix { .. } => "INVALID_CARD_PREFIX",
            Self::EncryptFailed => "ENCRYPT_FAILED",
            Self::DecryptFailed => "DECRYPT_FAILED",
            Self::HashFailed(_) => "HASH_FAILED",
            Self::InvalidHash => "INVALID_HASH",
        }
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength(_)
            | CryptoError::InvalidKeyEncoding
            | CryptoError::EmptySecret
            | CryptoError::InvalidPrefix { .. } => Self::Validation(err.to_string()),
            CryptoError::DecryptFailed | CryptoError::InvalidHash => {
                Self::Integrity("stored card data failed verification".to_string())
            }
            CryptoError::EncryptFailed | CryptoError::HashFailed(_) => {
                Self::Internal("cryptographic operation failed".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(matches!(
            AppError::from(CryptoError::InvalidKeyLength(7)),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(CryptoError::DecryptFailed),
            AppError::Integrity(_)
        ));
        assert!(matches!(
            AppError::from(CryptoError::EncryptFailed),
            AppError::Internal(_)
        ));
    }
}
