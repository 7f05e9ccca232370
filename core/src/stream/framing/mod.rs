//! Length-prefixed record framing.
//!
//! Responsibilities:
//! - Write `len (u32 LE) || payload` records
//! - Read them back with strict size bounds
//!
//! Non-responsibilities:
//! - Cryptography
//! - Nonce handling
//! - Buffer ownership (callers pass reusable buffers in)

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{FramingError, LenPrefix};
pub use encode::{encode_len_prefix, write_record};
pub use decode::{decode_len_prefix, read_record};
