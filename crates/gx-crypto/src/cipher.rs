use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};

use crate::encoding::{from_hex, to_hex};
use crate::error::{CryptoError, CryptoResult};

/// AES-GCM nonce length in bytes.
pub const IV_LEN: usize = 12;

/// Symmetric key for AES-GCM; the length selects AES-128 or AES-256.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey(Vec<u8>);

impl CipherKey {
    /// Wrap raw key bytes. Only 16- and 32-byte keys are accepted.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        match bytes.len() {
            16 | 32 => Ok(Self(bytes.to_vec())),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = from_hex(s)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CipherKey(<redacted {} bytes>)", self.0.len())
    }
}

fn check_iv(iv: &[u8]) -> CryptoResult<()> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidIvLength {
            expected: IV_LEN,
            actual: iv.len(),
        });
    }
    Ok(())
}

/// Encrypt UTF-8 text, returning hex ciphertext (with the GCM tag appended).
pub fn encrypt(plaintext: &str, key: &CipherKey, iv: &[u8]) -> CryptoResult<String> {
    check_iv(iv)?;
    let nonce = Nonce::from_slice(iv);
    let data = plaintext.as_bytes();
    let sealed = match key.len() {
        16 => Aes128Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(16))?
            .encrypt(nonce, data),
        _ => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?
            .encrypt(nonce, data),
    }
    .map_err(|_| CryptoError::Encryption)?;
    Ok(to_hex(sealed))
}

/// Decrypt hex ciphertext produced by [`encrypt`] with the same key and IV.
pub fn decrypt(ciphertext_hex: &str, key: &CipherKey, iv: &[u8]) -> CryptoResult<String> {
    check_iv(iv)?;
    let nonce = Nonce::from_slice(iv);
    let data = from_hex(ciphertext_hex)?;
    let opened = match key.len() {
        16 => Aes128Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(16))?
            .decrypt(nonce, data.as_slice()),
        _ => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?
            .decrypt(nonce, data.as_slice()),
    }
    .map_err(|_| CryptoError::Decryption)?;
    String::from_utf8(opened).map_err(|_| CryptoError::InvalidUtf8)
}
