// ## File: `src/constants.rs`

//! Protocol constants shared by the nonce codec, framing and stream engine.

/// Default maximum plaintext bytes sealed into one record.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 65535;

/// Size of the little-endian length prefix in front of every record.
pub const LEN_PREFIX: usize = 4;

/// Largest payload the length prefix can describe.
pub const MAX_RECORD_LEN: usize = u32::MAX as usize;

/// Top bit of nonce byte 0: clear for initiator-origin, set for responder-origin.
pub const DIRECTION_BIT: u8 = 0x80;

/// Stable key size for every built-in suite except AES-128-GCM.
pub const KEY_LEN_32: usize = 32;

/// AES-128-GCM key size.
pub const KEY_LEN_16: usize = 16;

/// Extended nonce (XChaCha20-Poly1305, XSalsa20-Poly1305).
pub const NONCE_LEN_24: usize = 24;

/// Cipher suite identifiers.
pub mod cipher_ids {
    pub const AES128_GCM: u16         = 0x0001;
    pub const AES256_GCM: u16         = 0x0002;
    pub const CHACHA20_POLY1305: u16  = 0x0003;
    pub const XCHACHA20_POLY1305: u16 = 0x0004;
    pub const XSALSA20_POLY1305: u16  = 0x0005;
}

/// HKDF info prefix for per-stream key derivation.
pub const KDF_INFO_PREFIX: &[u8] = b"crypto-stream|v1|stream-key|";
