// ## File: `src/crypto/cipher.rs`

//! Pluggable authenticated-encryption contract.
//!
//! Design notes:
//! - The stream engine and nonce codec only ever see `dyn Cipher`; concrete
//!   primitives live in `aead.rs`.
//! - Nonces are produced by the codec, never by the cipher.
//! - Both directions write into caller-owned buffers so the steady-state path
//!   allocates nothing.

use std::sync::Arc;

use crate::crypto::types::CryptoError;

/// Authenticated encryption with caller-supplied nonces.
///
/// Contract:
/// - `encrypt` writes `plaintext.len() + tag` bytes into `dst` and returns the
///   written length, which never exceeds `plaintext.len() + max_overhead()`.
///   Callers guarantee `dst.len() >= plaintext.len() + max_overhead()`.
/// - `decrypt` writes the recovered plaintext into `dst` and returns its length.
///   Callers guarantee `dst.len() >= ciphertext.len()`.
/// - Any verification failure is reported as `CryptoError::AuthenticationFailed`
///   with no further detail.
/// - `max_overhead` and `nonce_size` are constant for a given instance.
/// - Implementations never read past `nonce[..nonce_size()]`.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, dst: &mut [u8], plaintext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError>;

    fn decrypt(&self, dst: &mut [u8], ciphertext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError>;

    /// Upper bound on ciphertext expansion, excluding the nonce.
    fn max_overhead(&self) -> usize;

    fn nonce_size(&self) -> usize;
}

/// Cipher handle shared by one stream's encoder and decoder.
pub type SharedCipher = Arc<dyn Cipher>;

impl<C: Cipher + ?Sized> Cipher for Arc<C> {
    fn encrypt(&self, dst: &mut [u8], plaintext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        (**self).encrypt(dst, plaintext, nonce)
    }

    fn decrypt(&self, dst: &mut [u8], ciphertext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        (**self).decrypt(dst, ciphertext, nonce)
    }

    fn max_overhead(&self) -> usize {
        (**self).max_overhead()
    }

    fn nonce_size(&self) -> usize {
        (**self).nonce_size()
    }
}
