use byteorder::{ByteOrder, LittleEndian};

use crate::stream::framing::types::{FramingError, LenPrefix};
use crate::stream::transport::Transport;

#[inline]
pub fn decode_len_prefix(prefix: &LenPrefix) -> usize {
    LittleEndian::read_u32(prefix) as usize
}

/// Read one record from the transport into `dst`, returning the payload length.
///
/// Checks, in order:
/// - declared length above `max_len` → `RecordTooLarge` (nothing else is read)
/// - declared length above `dst.len()` → `ShortBuffer`
///
/// Blocks until the prefix and payload are fully read or the transport fails.
pub fn read_record<T: Transport + ?Sized>(
    transport: &T,
    dst: &mut [u8],
    prefix: &mut LenPrefix,
    max_len: usize,
) -> Result<usize, FramingError> {
    transport.read_exact(prefix)?;

    let n = decode_len_prefix(prefix);
    if n > max_len {
        return Err(FramingError::RecordTooLarge { len: n, max: max_len });
    }
    if n > dst.len() {
        return Err(FramingError::ShortBuffer { needed: n, available: dst.len() });
    }

    transport.read_exact(&mut dst[..n])?;
    Ok(n)
}
