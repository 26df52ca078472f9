//! Crypto helpers for the GX toolkit.
//!
//! Provides SHA-2/SHA-3 digests of bytes and JSON values, OS-backed random
//! bytes, hex/base64 codecs, and AES-GCM encryption with hex ciphertext.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod random;

pub use cipher::{decrypt, encrypt, CipherKey, IV_LEN};
pub use encoding::{from_base64, from_hex, to_base64, to_hex};
pub use error::{CryptoError, CryptoResult};
pub use hash::{digest, hash_hex, hash_value, HashAlgorithm};
pub use random::{default_iv, fill_random, generate_iv, generate_key, random_bytes, random_hex};
