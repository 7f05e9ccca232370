// ## File: `src/stream/config.rs`

//! Stream configuration: validated once at construction, immutable afterwards.
//!
//! Two surfaces:
//! - `StreamConfig`: the programmatic form, holding the cipher handle.
//! - `StreamOptions`: the serializable form (config files, env), every field
//!   optional and merged onto defaults.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_MAX_CHUNK_SIZE, MAX_RECORD_LEN};
use crate::crypto::{CipherSuite, SharedCipher};
use crate::types::StreamError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No cipher was provided.
    #[error("nil cipher")]
    MissingCipher,

    /// Chunk size must be greater than zero.
    #[error("max chunk size should be greater than 0, got {0}")]
    InvalidChunkSize(usize),

    /// Cipher nonce too short to carry the direction bit.
    #[error("cipher nonce size should be greater than 0, got {0}")]
    InvalidNonceSize(usize),

    /// chunk + overhead + nonce does not fit the length field.
    #[error("record capacity overflows: chunk={chunk}, overhead={overhead}, nonce={nonce}")]
    RecordCapacityOverflow { chunk: usize, overhead: usize, nonce: usize },
}

/// Validated configuration for one `EncryptedStream`.
#[derive(Clone)]
pub struct StreamConfig {
    cipher: SharedCipher,
    max_chunk_size: usize,
    initiator: bool,
    sequential_nonce: bool,
    disable_nonce_verification: bool,
}

impl StreamConfig {
    /// Defaults: 65535-byte chunks, responder role, random nonces, verification on.
    pub fn new(cipher: SharedCipher) -> Self {
        Self {
            cipher,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            initiator: false,
            sequential_nonce: false,
            disable_nonce_verification: false,
        }
    }

    /// Merge `options` onto the defaults. Unset fields keep their default.
    pub fn from_options(cipher: SharedCipher, options: &StreamOptions) -> Self {
        let defaults = Self::new(cipher);
        Self {
            max_chunk_size: options.max_chunk_size.unwrap_or(defaults.max_chunk_size),
            initiator: options.initiator.unwrap_or(defaults.initiator),
            sequential_nonce: options.sequential_nonce.unwrap_or(defaults.sequential_nonce),
            disable_nonce_verification: options
                .disable_nonce_verification
                .unwrap_or(defaults.disable_nonce_verification),
            ..defaults
        }
    }

    pub fn max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// The two endpoints of a stream must pick opposite roles.
    pub fn initiator(mut self, initiator: bool) -> Self {
        self.initiator = initiator;
        self
    }

    /// Both endpoints must agree. Only enable with a key unique to this stream.
    pub fn sequential_nonce(mut self, sequential_nonce: bool) -> Self {
        self.sequential_nonce = sequential_nonce;
        self
    }

    /// Leaves the stream open to reflection, replay, reorder and drop attacks.
    pub fn disable_nonce_verification(mut self, disable: bool) -> Self {
        self.disable_nonce_verification = disable;
        self
    }

    pub fn cipher(&self) -> &SharedCipher {
        &self.cipher
    }

    pub fn chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn is_sequential_nonce(&self) -> bool {
        self.sequential_nonce
    }

    pub fn is_nonce_verification_disabled(&self) -> bool {
        self.disable_nonce_verification
    }

    /// Largest record payload this configuration produces or accepts:
    /// `max_chunk_size + max_overhead + nonce_size`.
    pub fn record_capacity(&self) -> Result<usize, ConfigError> {
        let overhead = self.cipher.max_overhead();
        let nonce = self.cipher.nonce_size();
        self.max_chunk_size
            .checked_add(overhead)
            .and_then(|n| n.checked_add(nonce))
            .filter(|&n| n <= MAX_RECORD_LEN)
            .ok_or(ConfigError::RecordCapacityOverflow {
                chunk: self.max_chunk_size,
                overhead,
                nonce,
            })
    }

    /// Summary: Reject configurations the engine cannot run with.
    /// Called before any buffer is allocated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.max_chunk_size));
        }

        let nonce_size = self.cipher.nonce_size();
        if nonce_size == 0 {
            return Err(ConfigError::InvalidNonceSize(nonce_size));
        }

        self.record_capacity()?;
        Ok(())
    }
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("nonce_size", &self.cipher.nonce_size())
            .field("max_overhead", &self.cipher.max_overhead())
            .field("max_chunk_size", &self.max_chunk_size)
            .field("initiator", &self.initiator)
            .field("sequential_nonce", &self.sequential_nonce)
            .field("disable_nonce_verification", &self.disable_nonce_verification)
            .finish()
    }
}

/// Serializable stream options. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamOptions {
    pub cipher_suite: Option<CipherSuite>,
    pub max_chunk_size: Option<usize>,
    pub initiator: Option<bool>,
    pub sequential_nonce: Option<bool>,
    pub disable_nonce_verification: Option<bool>,
}

impl StreamOptions {
    /// Key the configured suite and build a validated `StreamConfig`.
    pub fn build(&self, key: &[u8]) -> Result<StreamConfig, StreamError> {
        let suite = self.cipher_suite.ok_or(ConfigError::MissingCipher)?;
        let config = StreamConfig::from_options(suite.build(key)?, self);
        config.validate()?;
        Ok(config)
    }
}
