//! Throughput of the encrypted stream record layer.
//!
//! Measures:
//! - Write path (chunk, seal, frame) into an in-memory sink
//! - Full write + read round trip through an in-memory wire
//!
//! Across every built-in suite and a few chunk sizes.

use std::io::{self, Cursor};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crypto_stream::crypto::CipherSuite;
use crypto_stream::stream::{EncryptedStream, SplitTransport, StreamConfig};

const PAYLOAD: usize = 1 << 20;

fn config(suite: CipherSuite, initiator: bool, chunk: usize) -> StreamConfig {
    let key = [0x42u8; 32];
    StreamConfig::new(suite.build(&key[..suite.key_len()]).unwrap())
        .initiator(initiator)
        .sequential_nonce(true)
        .max_chunk_size(chunk)
}

/// Benchmark the write path only
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("EncryptedStream/Write");
    group.throughput(Throughput::Bytes(PAYLOAD as u64));
    let data = vec![0xA5u8; PAYLOAD];

    for suite in CipherSuite::ALL {
        let stream = EncryptedStream::new(
            SplitTransport::new(io::empty(), io::sink()),
            config(suite, true, 65535),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(suite), &data, |b, data| {
            b.iter(|| black_box(stream.write(data).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark write then read of one payload, varying chunk size
fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("EncryptedStream/Roundtrip");
    group.throughput(Throughput::Bytes(PAYLOAD as u64));
    let data = vec![0x5Au8; PAYLOAD];

    for chunk in [1024usize, 16 * 1024, 65535] {
        let suite = CipherSuite::ChaCha20Poly1305;
        group.bench_with_input(BenchmarkId::new(suite.name(), chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let tx = EncryptedStream::new(
                    SplitTransport::new(io::empty(), Vec::with_capacity(PAYLOAD * 2)),
                    config(suite, true, chunk),
                )
                .unwrap();
                tx.write(&data).unwrap();
                let wire = tx.into_inner().into_inner().unwrap().1;

                let rx = EncryptedStream::new(
                    SplitTransport::new(Cursor::new(wire), io::sink()),
                    config(suite, false, chunk),
                )
                .unwrap();
                let mut out = vec![0u8; PAYLOAD];
                let mut filled = 0;
                while filled < PAYLOAD {
                    filled += rx.read(&mut out[filled..]).unwrap();
                }
                black_box(out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_roundtrip);
criterion_main!(benches);
