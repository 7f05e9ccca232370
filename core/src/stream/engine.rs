// ## File: `src/stream/engine.rs`

//! Encrypted stream engine.
//!
//! Design notes:
//! - Write path: split the source into `max_chunk_size` slices, seal each as
//!   `nonce || ciphertext` into a reusable buffer, frame it, hand it to the
//!   transport.
//! - Read path: pull one record into a reusable buffer, verify and open it into
//!   a reusable plaintext buffer, then serve reads from that window until it is
//!   drained.
//! - Every buffer is allocated once in `new`; the steady-state path allocates
//!   nothing.
//!
//! Concurrency:
//! - The closed flag is an atomic, so `close`/`is_closed` never wait on I/O.
//! - Reads are serialized by the read lock, writes by the write lock. The two
//!   sides share no lock and never block each other.
//! - The per-direction lock is what keeps codec calls in wire order.

use std::cmp;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, warn};

use crate::crypto::{Decoder, Encoder};
use crate::stream::config::StreamConfig;
use crate::stream::framing::{read_record, write_record, FramingError, LenPrefix};
use crate::stream::transport::{Capabilities, Transport};
use crate::telemetry::{StreamCounters, TelemetrySnapshot};
use crate::types::{PartialWrite, StreamError};

/// Read-side state, guarded by the read lock.
struct ReadState {
    decoder: Decoder,
    len_buf: LenPrefix,
    /// Raw record: nonce || ciphertext.
    record: Vec<u8>,
    /// Opened plaintext; `[start, end)` is still unread.
    plaintext: Vec<u8>,
    start: usize,
    end: usize,
}

/// Write-side state, guarded by the write lock.
struct WriteState {
    encoder: Encoder,
    len_buf: LenPrefix,
    record: Vec<u8>,
}

/// Authenticated, confidential byte stream over a `Transport`.
pub struct EncryptedStream<T> {
    config: StreamConfig,
    transport: T,
    capabilities: Capabilities,
    record_capacity: usize,
    closed: AtomicBool,
    read_state: Mutex<ReadState>,
    write_state: Mutex<WriteState>,
    sent: Mutex<StreamCounters>,
    received: Mutex<StreamCounters>,
    created: Instant,
}

impl<T: Transport> EncryptedStream<T> {
    /// Validate `config`, then build the codec pair and allocate all buffers.
    pub fn new(transport: T, config: StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let record_capacity = config.record_capacity()?;

        let cipher = config.cipher().clone();
        let encoder = Encoder::new(cipher.clone(), config.is_initiator(), config.is_sequential_nonce())?;
        let decoder = Decoder::new(
            cipher.clone(),
            config.is_initiator(),
            config.is_sequential_nonce(),
            config.is_nonce_verification_disabled(),
        )?;

        let capabilities = transport.capabilities();
        debug!(
            max_chunk_size = config.chunk_size(),
            initiator = config.is_initiator(),
            sequential_nonce = config.is_sequential_nonce(),
            nonce_verification = !config.is_nonce_verification_disabled(),
            nonce_size = cipher.nonce_size(),
            max_overhead = cipher.max_overhead(),
            ?capabilities,
            "encrypted stream created"
        );
        if config.is_nonce_verification_disabled() {
            warn!("nonce verification disabled; stream is open to reflection and replay");
        }

        let read_state = ReadState {
            decoder,
            len_buf: [0u8; 4],
            record: vec![0u8; record_capacity],
            plaintext: vec![0u8; config.chunk_size() + cipher.max_overhead()],
            start: 0,
            end: 0,
        };
        let write_state = WriteState {
            encoder,
            len_buf: [0u8; 4],
            record: vec![0u8; record_capacity],
        };

        Ok(Self {
            config,
            transport,
            capabilities,
            record_capacity,
            closed: AtomicBool::new(false),
            read_state: Mutex::new(read_state),
            write_state: Mutex::new(write_state),
            sent: Mutex::new(StreamCounters::default()),
            received: Mutex::new(StreamCounters::default()),
            created: Instant::now(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Read decrypted bytes into `dst`, returning how many were copied.
    ///
    /// Serves buffered plaintext first; only when it is drained does this block
    /// on the transport for exactly one new record. May return fewer bytes than
    /// `dst.len()`.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if dst.is_empty() {
            return Ok(0);
        }

        let mut state = lock(&self.read_state)?;
        self.ensure_open()?;

        while state.start >= state.end {
            if let Err(e) = self.fill(&mut state) {
                return Err(self.closed_or(e));
            }
        }

        let n = cmp::min(dst.len(), state.end - state.start);
        dst[..n].copy_from_slice(&state.plaintext[state.start..state.start + n]);
        state.start += n;

        Ok(n)
    }

    /// Pull, verify and open one record into the plaintext window.
    fn fill(&self, state: &mut ReadState) -> Result<(), StreamError> {
        let ReadState { decoder, len_buf, record, plaintext, start, end } = state;

        let n = match read_record(&self.transport, record, len_buf, self.record_capacity) {
            Ok(n) => n,
            Err(FramingError::Io(e)) => return Err(StreamError::Io(e)),
            Err(e) => {
                warn!(error = %e, "rejected inbound record");
                lock(&self.received)?.add_rejected();
                return Err(e.into());
            }
        };

        let opened = match decoder.decode(plaintext, &record[..n]) {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, record_len = n, "failed to decode inbound record");
                lock(&self.received)?.add_rejected();
                return Err(e);
            }
        };

        *start = 0;
        *end = opened;
        lock(&self.received)?.add_record(opened, n);

        Ok(())
    }

    /// Encrypt and send all of `src`, one record per `max_chunk_size` slice.
    ///
    /// On failure the error carries how many source bytes were already
    /// committed to the transport.
    pub fn write(&self, src: &[u8]) -> Result<usize, PartialWrite> {
        self.ensure_open().map_err(|e| PartialWrite::new(0, e))?;

        let mut state = lock(&self.write_state).map_err(|e| PartialWrite::new(0, e))?;
        self.ensure_open().map_err(|e| PartialWrite::new(0, e))?;

        let WriteState { encoder, len_buf, record } = &mut *state;
        let mut committed = 0;

        for chunk in src.chunks(self.config.chunk_size()) {
            let n = encoder
                .encode(record, chunk)
                .map_err(|e| PartialWrite::new(committed, e))?;

            write_record(&self.transport, &record[..n], len_buf)
                .map_err(|e| PartialWrite::new(committed, self.closed_or(e.into())))?;

            lock(&self.sent)
                .map_err(|e| PartialWrite::new(committed, e))?
                .add_record(chunk.len(), n);
            committed += chunk.len();
        }

        Ok(committed)
    }

    /// Mark the stream closed and close the transport if it supports it.
    ///
    /// Idempotent: later calls return `Ok(())` without touching the transport.
    /// Does not flush or drain in-flight records.
    pub fn close(&self) -> Result<(), StreamError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!("closing encrypted stream");
        if self.capabilities.contains(Capabilities::CLOSE) {
            self.transport.close()?;
        }
        Ok(())
    }

    pub fn local_addr(&self) -> Result<Option<SocketAddr>, StreamError> {
        if !self.capabilities.contains(Capabilities::ADDRESS) {
            return Ok(None);
        }
        Ok(self.transport.local_addr()?)
    }

    pub fn peer_addr(&self) -> Result<Option<SocketAddr>, StreamError> {
        if !self.capabilities.contains(Capabilities::ADDRESS) {
            return Ok(None);
        }
        Ok(self.transport.peer_addr()?)
    }

    /// Set both read and write deadlines. `None` clears them.
    pub fn set_deadline(&self, deadline: Option<Instant>) -> Result<(), StreamError> {
        self.set_read_deadline(deadline)?;
        self.set_write_deadline(deadline)
    }

    pub fn set_read_deadline(&self, deadline: Option<Instant>) -> Result<(), StreamError> {
        if self.capabilities.contains(Capabilities::DEADLINE) {
            self.transport.set_read_deadline(deadline)?;
        }
        Ok(())
    }

    pub fn set_write_deadline(&self, deadline: Option<Instant>) -> Result<(), StreamError> {
        if self.capabilities.contains(Capabilities::DEADLINE) {
            self.transport.set_write_deadline(deadline)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Counters for both directions. Never waits on transport I/O.
    pub fn telemetry(&self) -> Result<TelemetrySnapshot, StreamError> {
        let sent = lock(&self.sent)?.clone();
        let received = lock(&self.received)?.clone();
        Ok(TelemetrySnapshot::new(sent, received, self.created.elapsed()))
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    #[inline]
    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    /// A transport failure caused by our own `close` reports as `Closed`.
    fn closed_or(&self, e: StreamError) -> StreamError {
        match e {
            StreamError::Io(_) if self.is_closed() => StreamError::Closed,
            other => other,
        }
    }
}

fn lock<S>(m: &Mutex<S>) -> Result<MutexGuard<'_, S>, StreamError> {
    m.lock().map_err(|_| StreamError::Poisoned)
}

impl<T: Transport> io::Read for &EncryptedStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        EncryptedStream::read(self, buf).map_err(io::Error::from)
    }
}

impl<T: Transport> io::Read for EncryptedStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        EncryptedStream::read(self, buf).map_err(io::Error::from)
    }
}

impl<T: Transport> io::Write for &EncryptedStream<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport> io::Write for EncryptedStream<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Short writes follow `io::Write`: report committed bytes now, the error on
/// the next call.
fn io_write<T: Transport>(stream: &EncryptedStream<T>, buf: &[u8]) -> io::Result<usize> {
    match EncryptedStream::write(stream, buf) {
        Ok(n) => Ok(n),
        Err(partial) if partial.committed > 0 => Ok(partial.committed),
        Err(partial) => Err(partial.into_inner().into()),
    }
}
