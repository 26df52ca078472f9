use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Lowercase hex encoding.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

pub fn from_hex(s: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(s.trim()).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Standard (padded) base64 encoding.
pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(s: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))
}
