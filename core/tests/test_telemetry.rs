#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::time::Duration;

    use crypto_stream::crypto::CipherSuite;
    use crypto_stream::stream::{EncryptedStream, SplitTransport, StreamConfig};
    use crypto_stream::telemetry::{StreamCounters, TelemetrySnapshot};

    fn counters(records: u64, pt: u64, wire: u64, rejected: u64) -> StreamCounters {
        StreamCounters {
            records,
            bytes_plaintext: pt,
            bytes_wire: wire,
            records_rejected: rejected,
        }
    }

// # ✅ 1. Counters

    #[test]
    fn add_record_counts_prefix() {
        let mut c = StreamCounters::default();
        c.add_record(10, 38);
        c.add_record(0, 28);
        assert_eq!(c, counters(2, 10, 4 + 38 + 4 + 28, 0));
        assert_eq!(c.overhead_bytes(), 74 - 10);
    }

    #[test]
    fn merge_and_add_assign_agree() {
        let mut a = counters(1, 10, 42, 0);
        let mut b = a.clone();
        a.merge(&counters(2, 5, 70, 1));
        b += counters(2, 5, 70, 1);
        assert_eq!(a, b);
        assert_eq!(a, counters(3, 15, 112, 1));
    }

// # ✅ 2. Snapshot

    #[test]
    fn snapshot_totals_and_throughput() {
        let snap = TelemetrySnapshot::new(
            counters(4, 2000, 2128, 0),
            counters(1, 100, 132, 2),
            Duration::from_secs(2),
        );
        assert_eq!(snap.totals(), counters(5, 2100, 2260, 2));
        assert_eq!(snap.overhead_bytes(), 160);
        assert!((snap.throughput_sent_bytes_per_sec() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_elapsed_has_zero_throughput() {
        let snap = TelemetrySnapshot::new(counters(1, 10, 42, 0), StreamCounters::default(), Duration::ZERO);
        assert_eq!(snap.throughput_sent_bytes_per_sec(), 0.0);
    }

    #[test]
    fn snapshot_json_roundtrip() {
        let snap = TelemetrySnapshot::new(counters(1, 10, 42, 0), counters(0, 0, 0, 3), Duration::from_millis(5));
        let json = snap.to_json().unwrap();
        assert!(json.contains("\"records_rejected\":3"));
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

// # ✅ 3. Stream integration

    #[test]
    fn stream_counts_both_directions() {
        let key = [9u8; 32];
        let cipher = || CipherSuite::Aes256Gcm.build(&key).unwrap();

        let tx = EncryptedStream::new(
            SplitTransport::new(io::empty(), Vec::new()),
            StreamConfig::new(cipher()).initiator(true).max_chunk_size(100),
        )
        .unwrap();
        tx.write(&[1u8; 150]).unwrap();

        let sent = tx.telemetry().unwrap().sent;
        // Two records, each 4 (prefix) + 12 (nonce) + 16 (tag) on top of the plaintext.
        assert_eq!(sent, counters(2, 150, 150 + 2 * 32, 0));

        let wire = tx.into_inner().into_inner().unwrap().1;
        let rx = EncryptedStream::new(
            SplitTransport::new(Cursor::new(wire), io::sink()),
            StreamConfig::new(cipher()).initiator(false).max_chunk_size(100),
        )
        .unwrap();
        let mut buf = [0u8; 200];
        assert_eq!(rx.read(&mut buf).unwrap(), 100);
        assert_eq!(rx.read(&mut buf).unwrap(), 50);

        let snap = rx.telemetry().unwrap();
        assert_eq!(snap.received, sent);
        assert_eq!(snap.sent, StreamCounters::default());
    }
}
