/// Errors from crypto helper operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid key length: {0} bytes (expected 16 or 32)")]
    InvalidKeyLength(usize),

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Wrong key, wrong IV, or tampered ciphertext.
    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed")]
    Encryption,

    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
