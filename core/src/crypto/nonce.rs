// ## File: `src/crypto/nonce.rs`

//! crypto/nonce.rs
//! Per-direction nonce management around a `Cipher`.
//!
//! Design:
//! - Byte 0, top bit, names the sender: clear for the initiator, set for the
//!   responder. A decoder only accepts the peer's bit, which stops a middlebox
//!   from reflecting a party's own records back at it.
//! - Sequential mode: the remaining bits are a big-endian counter starting at
//!   zero. The decoder demands exactly its expected next value, so replayed,
//!   reordered and dropped records are all rejected.
//! - Random mode: the remaining bits come from the OS CSPRNG. Only the direction
//!   bit is checked. This is the weaker mode for keys shared across streams.
//!
//! Security notes:
//! - Sequential nonces are only safe when the key is unique to one stream.
//! - Neither side resynchronizes after a rejected record.
//! - `Encoder` and `Decoder` are not safe for out-of-order use; the stream engine
//!   serializes each direction behind its own lock.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{trace, warn};

use crate::constants::DIRECTION_BIT;
use crate::crypto::cipher::SharedCipher;
use crate::crypto::types::NonceError;
use crate::types::StreamError;

/// Seals outbound records as `nonce || ciphertext`.
pub struct Encoder {
    cipher: SharedCipher,
    initiator: bool,
    sequential_nonce: bool,
    next_nonce: Vec<u8>,
    max_nonce: Vec<u8>,
}

impl Encoder {
    pub fn new(cipher: SharedCipher, initiator: bool, sequential_nonce: bool) -> Result<Self, NonceError> {
        let nonce_size = cipher.nonce_size();
        validate_nonce_size(nonce_size)?;

        Ok(Self {
            cipher,
            initiator,
            sequential_nonce,
            next_nonce: init_nonce(nonce_size, initiator),
            max_nonce: max_nonce(nonce_size, initiator),
        })
    }

    /// Encode `plaintext` into `out` as `nonce || ciphertext`, returning the
    /// number of bytes written.
    ///
    /// `out` must hold `nonce_size + plaintext.len() + max_overhead` bytes.
    pub fn encode(&mut self, out: &mut [u8], plaintext: &[u8]) -> Result<usize, StreamError> {
        let nonce_size = self.next_nonce.len();
        let needed = nonce_size + plaintext.len() + self.cipher.max_overhead();
        if out.len() < needed {
            return Err(NonceError::BufferTooSmall { needed, available: out.len() }.into());
        }

        let (nonce, body) = out.split_at_mut(nonce_size);

        if self.sequential_nonce {
            if self.next_nonce >= self.max_nonce {
                warn!(initiator = self.initiator, "sequential nonce space exhausted");
                return Err(NonceError::Exhausted.into());
            }
            nonce.copy_from_slice(&self.next_nonce);
            increment_nonce(&mut self.next_nonce);
        } else {
            OsRng
                .try_fill_bytes(nonce)
                .map_err(|e| NonceError::Rng(e.to_string()))?;
            if self.initiator {
                nonce[0] &= !DIRECTION_BIT;
            } else {
                nonce[0] |= DIRECTION_BIT;
            }
        }

        let sealed = self.cipher.encrypt(body, plaintext, nonce)?;
        trace!(plaintext_len = plaintext.len(), sealed_len = sealed, "record encoded");

        Ok(nonce_size + sealed)
    }

    /// Next nonce the sequential counter will hand out.
    pub fn next_nonce(&self) -> &[u8] {
        &self.next_nonce
    }

    pub fn nonce_size(&self) -> usize {
        self.next_nonce.len()
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }
}

/// Verifies and opens inbound `nonce || ciphertext` records.
pub struct Decoder {
    cipher: SharedCipher,
    initiator: bool,
    sequential_nonce: bool,
    disable_nonce_verification: bool,
    next_nonce: Vec<u8>,
}

impl Decoder {
    /// The expected counter starts at the peer's initial value.
    pub fn new(
        cipher: SharedCipher,
        initiator: bool,
        sequential_nonce: bool,
        disable_nonce_verification: bool,
    ) -> Result<Self, NonceError> {
        let nonce_size = cipher.nonce_size();
        validate_nonce_size(nonce_size)?;

        Ok(Self {
            cipher,
            initiator,
            sequential_nonce,
            disable_nonce_verification,
            next_nonce: init_nonce(nonce_size, !initiator),
        })
    }

    /// Decode `record` into `out`, returning the plaintext length.
    ///
    /// `out` must hold at least `record.len() - nonce_size` bytes.
    pub fn decode(&mut self, out: &mut [u8], record: &[u8]) -> Result<usize, StreamError> {
        let nonce_size = self.next_nonce.len();
        if record.len() <= nonce_size {
            return Err(NonceError::InvalidRecordSize { len: record.len(), nonce_size }.into());
        }

        let (nonce, ciphertext) = record.split_at(nonce_size);

        if !self.disable_nonce_verification {
            // An initiator only accepts responder-origin records and vice versa.
            if is_responder_nonce(nonce) != self.initiator {
                warn!(
                    initiator = self.initiator,
                    nonce = %hex::encode(nonce),
                    "rejected record with wrong nonce direction"
                );
                return Err(NonceError::WrongDirection.into());
            }

            if self.sequential_nonce && nonce != self.next_nonce.as_slice() {
                warn!(
                    expected = %hex::encode(&self.next_nonce),
                    received = %hex::encode(nonce),
                    "rejected record with out-of-sequence nonce"
                );
                return Err(NonceError::WrongSequence.into());
            }
        }

        let opened = self.cipher.decrypt(out, ciphertext, nonce)?;

        if self.sequential_nonce {
            increment_nonce(&mut self.next_nonce);
        }
        trace!(record_len = record.len(), plaintext_len = opened, "record decoded");

        Ok(opened)
    }

    /// Nonce the decoder expects next in sequential mode.
    pub fn next_nonce(&self) -> &[u8] {
        &self.next_nonce
    }

    pub fn nonce_size(&self) -> usize {
        self.next_nonce.len()
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }
}

/// Summary: The direction bit needs at least one nonce byte.
#[inline]
pub fn validate_nonce_size(nonce_size: usize) -> Result<(), NonceError> {
    if nonce_size == 0 {
        return Err(NonceError::UnsupportedNonceSize(nonce_size));
    }
    Ok(())
}

/// First nonce of a direction: all zero, with the direction bit set for the responder.
pub fn init_nonce(nonce_size: usize, initiator: bool) -> Vec<u8> {
    let mut b = vec![0u8; nonce_size];
    if !initiator && nonce_size > 0 {
        b[0] |= DIRECTION_BIT;
    }
    b
}

/// Saturation value of a direction's counter: all ones within its namespace.
pub fn max_nonce(nonce_size: usize, initiator: bool) -> Vec<u8> {
    let mut b = vec![0xFFu8; nonce_size];
    if initiator && nonce_size > 0 {
        b[0] &= !DIRECTION_BIT;
    }
    b
}

/// Increment a big-endian counter in place, carrying leftward.
#[inline]
pub fn increment_nonce(b: &mut [u8]) {
    for byte in b.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

#[inline]
pub fn is_responder_nonce(nonce: &[u8]) -> bool {
    nonce.first().map_or(false, |b| b & DIRECTION_BIT != 0)
}
