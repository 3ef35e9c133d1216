//! Keyed integrity tags.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 key for tagging card and credit records.
#[derive(Clone)]
pub struct IntegrityKey {
    mac: HmacSha256,
}

impl IntegrityKey {
    /// Creates a key from a secret.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EmptySecret` for an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| CryptoError::EmptySecret)?;
        Ok(Self { mac })
    }

    /// Lowercase hex tag over the concatenation of `parts`.
    #[must_use]
    pub fn tag(&self, parts: &[&str]) -> String {
        hex::encode(self.keyed(parts).finalize().into_bytes())
    }

    /// Constant-time check of `tag` against `parts`.
    #[must_use]
    pub fn verify(&self, parts: &[&str], tag: &str) -> bool {
        let Ok(expected) = hex::decode(tag) else {
            return false;
        };
        self.keyed(parts).verify_slice(&expected).is_ok()
    }

    fn keyed(&self, parts: &[&str]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        for part in parts {
            mac.update(part.as_bytes());
        }
        mac
    }
}

impl std::fmt::Debug for IntegrityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IntegrityKey(..)")
    }
}
