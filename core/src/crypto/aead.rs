// ## File: `src/crypto/aead.rs`

//! src/crypto/aead.rs
//! Concrete `Cipher` implementations over RustCrypto AEAD primitives.
//!
//! Design notes:
//! - `AeadCipher<A>` adapts any in-place AEAD and derives nonce size and tag
//!   overhead from the primitive's type-level sizes.
//! - `SecretBoxCipher` is NaCl secretbox (XSalsa20-Poly1305, 24-byte nonce,
//!   tag in front of the ciphertext).
//! - Encryption and decryption run in place inside the caller's buffer with a
//!   detached tag, so nothing is allocated per record.
//! - Tag verification is constant-time and fails closed: on failure the
//!   partially written plaintext is wiped before returning.

use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, KeySizeUser, Nonce, Tag};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use crypto_secretbox::XSalsa20Poly1305;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::constants::{cipher_ids, KEY_LEN_16, KEY_LEN_32, NONCE_LEN_24};
use crate::crypto::cipher::{Cipher, SharedCipher};
use crate::crypto::types::CryptoError;

/// Generic adapter from a RustCrypto AEAD to `Cipher`.
#[derive(Clone)]
pub struct AeadCipher<A> {
    aead: A,
}

pub type Aes128GcmCipher = AeadCipher<Aes128Gcm>;
pub type Aes256GcmCipher = AeadCipher<Aes256Gcm>;
pub type ChaCha20Poly1305Cipher = AeadCipher<ChaCha20Poly1305>;
pub type XChaCha20Poly1305Cipher = AeadCipher<XChaCha20Poly1305>;

impl<A> AeadCipher<A> {
    /// Wrap an already keyed primitive.
    pub fn from_aead(aead: A) -> Self {
        Self { aead }
    }
}

impl<A: KeyInit> AeadCipher<A> {
    /// Key the primitive from raw bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let aead = A::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLen {
            expected: <A as KeySizeUser>::KeySize::USIZE,
            actual: key.len(),
        })?;
        Ok(Self { aead })
    }
}

impl<A: AeadInPlace> AeadCipher<A> {
    #[inline]
    fn tag_len() -> usize {
        <A as AeadCore>::TagSize::USIZE
    }

    #[inline]
    fn nonce_len() -> usize {
        <A as AeadCore>::NonceSize::USIZE
    }

    fn check_nonce(nonce: &[u8]) -> Result<&Nonce<A>, CryptoError> {
        let expected = Self::nonce_len();
        if nonce.len() < expected {
            return Err(CryptoError::InvalidNonceLen { expected, actual: nonce.len() });
        }
        Ok(Nonce::<A>::from_slice(&nonce[..expected]))
    }
}

impl<A> Cipher for AeadCipher<A>
where
    A: AeadInPlace + Send + Sync,
{
    fn encrypt(&self, dst: &mut [u8], plaintext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        let nonce = Self::check_nonce(nonce)?;
        let tag_len = Self::tag_len();
        let needed = plaintext.len() + tag_len;
        if dst.len() < needed {
            return Err(CryptoError::BufferTooSmall { needed, available: dst.len() });
        }

        let (body, rest) = dst.split_at_mut(plaintext.len());
        body.copy_from_slice(plaintext);
        let tag = self
            .aead
            .encrypt_in_place_detached(nonce, &[], body)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        rest[..tag_len].copy_from_slice(&tag);

        Ok(needed)
    }

    fn decrypt(&self, dst: &mut [u8], ciphertext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        let nonce = Self::check_nonce(nonce)?;
        let tag_len = Self::tag_len();
        if ciphertext.len() < tag_len {
            return Err(CryptoError::AuthenticationFailed);
        }

        let body_len = ciphertext.len() - tag_len;
        if dst.len() < body_len {
            return Err(CryptoError::BufferTooSmall { needed: body_len, available: dst.len() });
        }

        let (body, tag) = ciphertext.split_at(body_len);
        let out = &mut dst[..body_len];
        out.copy_from_slice(body);

        if self
            .aead
            .decrypt_in_place_detached(nonce, &[], out, Tag::<A>::from_slice(tag))
            .is_err()
        {
            out.zeroize();
            return Err(CryptoError::AuthenticationFailed);
        }

        Ok(body_len)
    }

    fn max_overhead(&self) -> usize {
        Self::tag_len() + <A as AeadCore>::CiphertextOverhead::USIZE
    }

    fn nonce_size(&self) -> usize {
        Self::nonce_len()
    }
}

impl<A: AeadInPlace> fmt::Debug for AeadCipher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AeadCipher")
            .field("nonce_size", &Self::nonce_len())
            .field("tag_len", &Self::tag_len())
            .finish_non_exhaustive()
    }
}

/// NaCl `secretbox`: XSalsa20-Poly1305 with a fixed 24-byte nonce.
///
/// Sealed layout is NaCl's `tag || ciphertext`, so records interoperate with
/// any `crypto_secretbox_easy` / `secretbox.Seal` peer. The extended nonce
/// makes random-nonce mode safe for long-lived keys.
#[derive(Clone)]
pub struct SecretBoxCipher {
    aead: XSalsa20Poly1305,
}

impl SecretBoxCipher {
    pub const NONCE_SIZE: usize = NONCE_LEN_24;
    pub const TAG_SIZE: usize = <XSalsa20Poly1305 as AeadCore>::TagSize::USIZE;

    pub fn new(key: &[u8; KEY_LEN_32]) -> Self {
        Self { aead: XSalsa20Poly1305::new(key.into()) }
    }

    pub fn from_slice(key: &[u8]) -> Result<Self, CryptoError> {
        let aead = XSalsa20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() })?;
        Ok(Self { aead })
    }
}

impl Cipher for SecretBoxCipher {
    fn encrypt(&self, dst: &mut [u8], plaintext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        let nonce = AeadCipher::<XSalsa20Poly1305>::check_nonce(nonce)?;
        let needed = Self::TAG_SIZE + plaintext.len();
        if dst.len() < needed {
            return Err(CryptoError::BufferTooSmall { needed, available: dst.len() });
        }

        let (tag_out, rest) = dst.split_at_mut(Self::TAG_SIZE);
        let body = &mut rest[..plaintext.len()];
        body.copy_from_slice(plaintext);
        let tag = self
            .aead
            .encrypt_in_place_detached(nonce, &[], body)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        tag_out.copy_from_slice(&tag);

        Ok(needed)
    }

    fn decrypt(&self, dst: &mut [u8], ciphertext: &[u8], nonce: &[u8]) -> Result<usize, CryptoError> {
        let nonce = AeadCipher::<XSalsa20Poly1305>::check_nonce(nonce)?;
        if ciphertext.len() < Self::TAG_SIZE {
            return Err(CryptoError::AuthenticationFailed);
        }

        let (tag, body) = ciphertext.split_at(Self::TAG_SIZE);
        if dst.len() < body.len() {
            return Err(CryptoError::BufferTooSmall { needed: body.len(), available: dst.len() });
        }
        let out = &mut dst[..body.len()];
        out.copy_from_slice(body);

        if self
            .aead
            .decrypt_in_place_detached(nonce, &[], out, Tag::<XSalsa20Poly1305>::from_slice(tag))
            .is_err()
        {
            out.zeroize();
            return Err(CryptoError::AuthenticationFailed);
        }

        Ok(body.len())
    }

    fn max_overhead(&self) -> usize {
        Self::TAG_SIZE
    }

    fn nonce_size(&self) -> usize {
        Self::NONCE_SIZE
    }
}

impl fmt::Debug for SecretBoxCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBoxCipher").finish_non_exhaustive()
    }
}

/// Built-in cipher suites, selectable from configuration.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherSuite {
    Aes128Gcm         = cipher_ids::AES128_GCM,
    Aes256Gcm         = cipher_ids::AES256_GCM,
    #[serde(rename = "chacha20_poly1305")]
    ChaCha20Poly1305  = cipher_ids::CHACHA20_POLY1305,
    #[serde(rename = "xchacha20_poly1305")]
    XChaCha20Poly1305 = cipher_ids::XCHACHA20_POLY1305,
    #[serde(rename = "xsalsa20_poly1305")]
    XSalsa20Poly1305  = cipher_ids::XSALSA20_POLY1305,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 5] = [
        CipherSuite::Aes128Gcm,
        CipherSuite::Aes256Gcm,
        CipherSuite::ChaCha20Poly1305,
        CipherSuite::XChaCha20Poly1305,
        CipherSuite::XSalsa20Poly1305,
    ];

    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn try_from_u16(v: u16) -> Result<Self, CryptoError> {
        match v {
            cipher_ids::AES128_GCM => Ok(CipherSuite::Aes128Gcm),
            cipher_ids::AES256_GCM => Ok(CipherSuite::Aes256Gcm),
            cipher_ids::CHACHA20_POLY1305 => Ok(CipherSuite::ChaCha20Poly1305),
            cipher_ids::XCHACHA20_POLY1305 => Ok(CipherSuite::XChaCha20Poly1305),
            cipher_ids::XSALSA20_POLY1305 => Ok(CipherSuite::XSalsa20Poly1305),
            other => Err(CryptoError::UnsupportedCipher { cipher_id: other }),
        }
    }

    pub const fn key_len(self) -> usize {
        match self {
            CipherSuite::Aes128Gcm => KEY_LEN_16,
            _ => KEY_LEN_32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes128Gcm => "aes128-gcm",
            CipherSuite::Aes256Gcm => "aes256-gcm",
            CipherSuite::ChaCha20Poly1305 => "chacha20-poly1305",
            CipherSuite::XChaCha20Poly1305 => "xchacha20-poly1305",
            CipherSuite::XSalsa20Poly1305 => "xsalsa20-poly1305",
        }
    }

    /// Key the suite and return a handle ready for `StreamConfig`.
    pub fn build(self, key: &[u8]) -> Result<SharedCipher, CryptoError> {
        if key.len() != self.key_len() {
            return Err(CryptoError::InvalidKeyLen { expected: self.key_len(), actual: key.len() });
        }

        let cipher: SharedCipher = match self {
            CipherSuite::Aes128Gcm => Arc::new(Aes128GcmCipher::new(key)?),
            CipherSuite::Aes256Gcm => Arc::new(Aes256GcmCipher::new(key)?),
            CipherSuite::ChaCha20Poly1305 => Arc::new(ChaCha20Poly1305Cipher::new(key)?),
            CipherSuite::XChaCha20Poly1305 => Arc::new(XChaCha20Poly1305Cipher::new(key)?),
            CipherSuite::XSalsa20Poly1305 => Arc::new(SecretBoxCipher::from_slice(key)?),
        };
        Ok(cipher)
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
