use std::io;

use thiserror::Error;

use crate::crypto::{CryptoError, NonceError};
use crate::stream::config::ConfigError;
use crate::stream::framing::FramingError;

/// Unified stream error covering configuration, framing, nonce, crypto,
/// lifecycle and transport failures.
/// - `#[from]` conversions enable `?` across layers.
/// - Transport errors are carried verbatim, never rewrapped.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport error, passed through untouched (including end-of-stream).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Construction-time configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Record framing error (size bounds, short buffer).
    #[error("framing error: {0}")]
    Framing(FramingError),

    /// Nonce protocol error (direction, sequence, exhaustion, size).
    #[error("nonce error: {0}")]
    Nonce(#[from] NonceError),

    /// Cipher error, including the opaque authentication failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Operation attempted after `close`.
    #[error("stream closed")]
    Closed,

    /// A reader or writer panicked while holding a direction lock.
    #[error("stream lock poisoned")]
    Poisoned,
}

impl StreamError {
    /// True for per-record protocol and authentication failures, after which
    /// the stream must be abandoned rather than resynchronized.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            StreamError::Nonce(_)
                | StreamError::Crypto(CryptoError::AuthenticationFailed)
                | StreamError::Framing(FramingError::RecordTooLarge { .. })
        )
    }
}

impl From<FramingError> for StreamError {
    fn from(e: FramingError) -> Self {
        // Transport failures inside framing surface as plain I/O errors.
        match e {
            FramingError::Io(io) => StreamError::Io(io),
            other => StreamError::Framing(other),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match e {
            StreamError::Io(inner) => return inner,
            StreamError::Closed => io::ErrorKind::BrokenPipe,
            StreamError::Config(_) => io::ErrorKind::InvalidInput,
            StreamError::Framing(_) | StreamError::Nonce(_) | StreamError::Crypto(_) => {
                io::ErrorKind::InvalidData
            }
            StreamError::Poisoned => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

/// A write that failed part-way.
///
/// `committed` source bytes were fully written to the transport before the
/// failing chunk; the peer may have received exactly those.
#[derive(Debug, Error)]
#[error("write failed after {committed} bytes: {source}")]
pub struct PartialWrite {
    pub committed: usize,
    #[source]
    pub source: StreamError,
}

impl PartialWrite {
    pub fn new(committed: usize, source: impl Into<StreamError>) -> Self {
        Self { committed, source: source.into() }
    }

    pub fn into_inner(self) -> StreamError {
        self.source
    }
}
