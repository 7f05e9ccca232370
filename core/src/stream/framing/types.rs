use std::io;

use thiserror::Error;

pub use crate::constants::{LEN_PREFIX, MAX_RECORD_LEN};

/// Scratch buffer for one length prefix.
pub type LenPrefix = [u8; LEN_PREFIX];

#[derive(Debug, Error)]
pub enum FramingError {
    /// Declared or outgoing payload exceeds the allowed record size.
    #[error("record too large: {len} bytes (max {max})")]
    RecordTooLarge { len: usize, max: usize },

    /// Destination cannot hold the declared payload.
    #[error("short buffer: record needs {needed} bytes, buffer holds {available}")]
    ShortBuffer { needed: usize, available: usize },

    /// Transport failure while reading or writing a record.
    #[error(transparent)]
    Io(#[from] io::Error),
}
