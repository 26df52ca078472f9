use rand::rngs::OsRng;
use rand::RngCore;

use crate::cipher::{CipherKey, IV_LEN};
use crate::encoding::to_hex;
use crate::error::CryptoResult;

/// Fill `buf` with bytes from the operating system CSPRNG.
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// `size` fresh random bytes.
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    fill_random(&mut buf);
    buf
}

/// `size` random bytes rendered as hex (the string is `2 * size` long).
pub fn random_hex(size: usize) -> String {
    to_hex(random_bytes(size))
}

/// Random initialization vector. Pass [`IV_LEN`] for AES-GCM.
pub fn generate_iv(size: usize) -> Vec<u8> {
    random_bytes(size)
}

/// Random AES key of `size` bytes (16 or 32).
pub fn generate_key(size: usize) -> CryptoResult<CipherKey> {
    CipherKey::from_bytes(&random_bytes(size))
}

/// Default IV for [`crate::encrypt`].
pub fn default_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    fill_random(&mut iv);
    iv
}
