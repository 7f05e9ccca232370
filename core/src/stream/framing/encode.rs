use byteorder::{ByteOrder, LittleEndian};

use crate::stream::framing::types::{FramingError, LenPrefix, MAX_RECORD_LEN};
use crate::stream::transport::Transport;

/// Encode a payload length into the 4-byte little-endian prefix.
#[inline]
pub fn encode_len_prefix(len: usize, prefix: &mut LenPrefix) -> Result<(), FramingError> {
    if len > MAX_RECORD_LEN {
        return Err(FramingError::RecordTooLarge { len, max: MAX_RECORD_LEN });
    }
    LittleEndian::write_u32(prefix, len as u32);
    Ok(())
}

/// Write one record to the transport.
///
/// Layout:
///
/// ```text
/// [ length (4, LE) ]
/// [ payload (length) ]
/// ```
///
/// Blocks until both parts are written or the transport fails.
pub fn write_record<T: Transport + ?Sized>(
    transport: &T,
    payload: &[u8],
    prefix: &mut LenPrefix,
) -> Result<(), FramingError> {
    encode_len_prefix(payload.len(), prefix)?;
    transport.write_all(prefix)?;
    transport.write_all(payload)?;
    Ok(())
}
