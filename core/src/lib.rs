//! crypto-stream
//!
//! Turns any reliable, ordered byte channel into an authenticated, confidential
//! stream. Callers write plaintext; every byte on the wire is a length-prefixed
//! `nonce || ciphertext` record protected against reflection, and in sequential
//! mode against replay and reordering.
//!
//! Key exchange is out of scope: both endpoints start from a shared key.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

pub mod crypto;
pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::crypto::{
        derive_stream_key, Aes128GcmCipher, Aes256GcmCipher, ChaCha20Poly1305Cipher, Cipher,
        CipherSuite, SecretBoxCipher, SharedCipher, XChaCha20Poly1305Cipher,
    };
    pub use crate::stream::{EncryptedStream, SocketTransport, StreamConfig, StreamOptions, Transport};
    pub use crate::types::{PartialWrite, StreamError};
}
