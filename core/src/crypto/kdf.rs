// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! HKDF-based per-stream key derivation from a pre-shared master secret.
//!
//! Design:
//! - HKDF-Extract(salt, master_key) -> PRK
//! - HKDF-Expand(PRK, prefix || context) -> stream key (32 bytes)
//!
//! Notes:
//! - This is not a key exchange. Both sides already hold `master_key` and agree
//!   on `salt` and `context` out of band.
//! - Sequential nonces restart at zero on every stream, so every stream must run
//!   under its own key. A fresh salt per stream gives exactly that.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::constants::{KDF_INFO_PREFIX, KEY_LEN_32};
use crate::crypto::types::CryptoError;

/// Summary: Derive a 32-byte per-stream key via HKDF-SHA-256.
///
/// Errors:
/// - Empty master key or all-zero salt returns `CryptoError::Kdf`.
pub fn derive_stream_key(
    master_key: &[u8],
    salt: &[u8],
    context: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN_32]>, CryptoError> {
    if master_key.is_empty() {
        return Err(CryptoError::Kdf("master key must not be empty".into()));
    }
    if salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::Kdf("salt must not be all-zero".into()));
    }

    let mut info = Vec::with_capacity(KDF_INFO_PREFIX.len() + context.len());
    info.extend_from_slice(KDF_INFO_PREFIX);
    info.extend_from_slice(context);

    let hk = Hkdf::<Sha256>::new(Some(salt), master_key);
    let mut key = Zeroizing::new([0u8; KEY_LEN_32]);
    hk.expand(&info, &mut key[..])
        .map_err(|_| CryptoError::Kdf("HKDF expand failed (SHA-256)".into()))?;

    Ok(key)
}
