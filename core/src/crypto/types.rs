// ## File: `src/crypto/types.rs`

use thiserror::Error;

/// Errors raised by cipher construction and the AEAD primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Unsupported cipher suite id.
    #[error("unsupported cipher suite: 0x{cipher_id:04x}")]
    UnsupportedCipher { cipher_id: u16 },

    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length does not match the cipher.
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// Destination buffer cannot hold the output.
    #[error("output buffer too small: needed={needed}, available={available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Ciphertext/nonce pair failed verification. Deliberately carries no detail.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Seal failed inside the primitive.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Key derivation failure with context.
    #[error("key derivation failed: {0}")]
    Kdf(String),
}

/// Errors raised by the nonce codec.
#[derive(Debug, Error)]
pub enum NonceError {
    /// Sequential counter reached its last value; the key must be rotated.
    #[error("max nonce reached")]
    Exhausted,

    /// Record carries the wrong direction bit (mismatched roles or reflection).
    #[error("wrong nonce direction")]
    WrongDirection,

    /// Record nonce is not the expected next value (replay, reorder or drop).
    #[error("wrong nonce value")]
    WrongSequence,

    /// Record too short to hold a nonce and any ciphertext.
    #[error("invalid record size {len} (nonce size {nonce_size})")]
    InvalidRecordSize { len: usize, nonce_size: usize },

    /// Output buffer cannot hold nonce plus ciphertext.
    #[error("nonce buffer too small: needed={needed}, available={available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Cipher nonce too short to carry the direction bit.
    #[error("unsupported nonce size {0}")]
    UnsupportedNonceSize(usize),

    /// Secure random source failed.
    #[error("random nonce generation failed: {0}")]
    Rng(String),
}
