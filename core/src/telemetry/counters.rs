// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable per-direction counters.
//!
//! Summary: Each direction of a stream owns one `StreamCounters` inside its own
//! lock, so counting needs no atomics. Merged into a `TelemetrySnapshot` on demand.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::constants::LEN_PREFIX;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCounters {
    /// Records successfully written or read.
    pub records: u64,
    /// Plaintext bytes carried by those records.
    pub bytes_plaintext: u64,
    /// Bytes on the wire: length prefix + nonce + ciphertext.
    pub bytes_wire: u64,
    /// Inbound records rejected by framing, nonce or authentication checks.
    pub records_rejected: u64,
}

impl StreamCounters {
    /// Record one framed record.
    ///
    /// - `pt_len`: plaintext length sealed into / opened from the record
    /// - `payload_len`: framed payload length (nonce + ciphertext)
    pub fn add_record(&mut self, pt_len: usize, payload_len: usize) {
        self.records += 1;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_wire += (LEN_PREFIX + payload_len) as u64;
    }

    pub fn add_rejected(&mut self) {
        self.records_rejected += 1;
    }

    /// Framing and crypto bytes added on top of the plaintext.
    pub fn overhead_bytes(&self) -> u64 {
        self.bytes_wire.saturating_sub(self.bytes_plaintext)
    }

    pub fn merge(&mut self, other: &StreamCounters) {
        self.records += other.records;
        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_wire += other.bytes_wire;
        self.records_rejected += other.records_rejected;
    }
}

impl AddAssign for StreamCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
