//! AES-GCM sealing for card fields.
//!
//! Output is `hex(nonce || ciphertext || tag)` with a fresh 96-bit nonce per
//! call, so every ciphertext carries its own IV.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm, KeyInit,
    aead::{Aead, AeadCore, Nonce, consts::U12},
    aes::Aes192,
};
use rand::{RngCore, rngs::OsRng};

use super::CryptoError;

type Aes192Gcm = AesGcm<Aes192, U12>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone)]
enum Engine {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// Authenticated cipher for card numbers and expiry dates.
#[derive(Clone)]
pub struct CardCipher {
    engine: Engine,
}

impl CardCipher {
    /// Creates a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` unless the key is 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::InvalidKeyLength(key.len());
        let engine = match key.len() {
            16 => Engine::Aes128(Box::new(Aes128Gcm::new_from_slice(key).map_err(invalid)?)),
            24 => Engine::Aes192(Box::new(Aes192Gcm::new_from_slice(key).map_err(invalid)?)),
            32 => Engine::Aes256(Box::new(Aes256Gcm::new_from_slice(key).map_err(invalid)?)),
            other => return Err(CryptoError::InvalidKeyLength(other)),
        };
        Ok(Self { engine })
    }

    /// Creates a cipher from a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyEncoding` for non-hex input, then the
    /// same length check as [`CardCipher::new`].
    pub fn from_hex(key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(key.trim()).map_err(|_| CryptoError::InvalidKeyEncoding)?;
        Self::new(&bytes)
    }

    /// Key size in bits.
    #[must_use]
    pub const fn key_bits(&self) -> u16 {
        match self.engine {
            Engine::Aes128(_) => 128,
            Engine::Aes192(_) => 192,
            Engine::Aes256(_) => 256,
        }
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptFailed` if the AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        match &self.engine {
            Engine::Aes128(c) => seal(c.as_ref(), plaintext.as_bytes()),
            Engine::Aes192(c) => seal(c.as_ref(), plaintext.as_bytes()),
            Engine::Aes256(c) => seal(c.as_ref(), plaintext.as_bytes()),
        }
    }

    /// Decrypts a value produced by [`CardCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::DecryptFailed` for malformed hex, truncated input,
    /// a wrong key, tampered bytes, or non-UTF-8 plaintext.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = hex::decode(ciphertext).map_err(|_| CryptoError::DecryptFailed)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DecryptFailed);
        }
        let plaintext = match &self.engine {
            Engine::Aes128(c) => open(c.as_ref(), &raw)?,
            Engine::Aes192(c) => open(c.as_ref(), &raw)?,
            Engine::Aes256(c) => open(c.as_ref(), &raw)?,
        };
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptFailed)
    }
}

impl std::fmt::Debug for CardCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardCipher(AES-{}-GCM)", self.key_bits())
    }
}

fn seal<C>(cipher: &C, plaintext: &[u8]) -> Result<String, CryptoError>
where
    C: Aead + AeadCore<NonceSize = U12>,
{
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = cipher
        .encrypt(Nonce::<C>::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptFailed)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(hex::encode(out))
}

fn open<C>(cipher: &C, raw: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: Aead + AeadCore<NonceSize = U12>,
{
    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::DecryptFailed)
}
