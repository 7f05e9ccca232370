// ## src/telemetry/snapshot.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::StreamCounters;

/// Immutable view of a stream's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub sent: StreamCounters,
    pub received: StreamCounters,
    /// Time since the stream was constructed.
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn new(sent: StreamCounters, received: StreamCounters, elapsed: Duration) -> Self {
        Self { sent, received, elapsed }
    }

    pub fn totals(&self) -> StreamCounters {
        let mut total = self.sent.clone();
        total.merge(&self.received);
        total
    }

    pub fn overhead_bytes(&self) -> u64 {
        self.totals().overhead_bytes()
    }

    /// Outbound plaintext throughput in bytes per second.
    pub fn throughput_sent_bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sent.bytes_plaintext as f64 / secs
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
