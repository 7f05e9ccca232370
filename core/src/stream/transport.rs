// ## File: `src/stream/transport.rs`

//! Transport abstraction consumed by the stream engine.
//!
//! Design notes:
//! - Only blocking `read_exact` / `write_all` are required. Both take `&self` so a
//!   reader and a writer can run concurrently on one transport.
//! - Close, address and deadline support are optional. A transport advertises
//!   them through `capabilities()`, which the engine resolves once at
//!   construction; unsupported operations are no-ops there.
//! - Transport errors are returned verbatim. The only error a transport makes up
//!   itself is `TimedOut`, from `SocketTransport` once a deadline has passed.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bitflags::bitflags;

bitflags! {
    /// Optional operations a transport supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const CLOSE    = 0b0000_0001;
        const ADDRESS  = 0b0000_0010;
        const DEADLINE = 0b0000_0100;
    }
}

/// Reliable, ordered, full-duplex byte channel.
pub trait Transport {
    /// Block until `buf` is filled, or fail (including `UnexpectedEof`).
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()>;

    /// Block until all of `buf` is written, or fail.
    fn write_all(&self, buf: &[u8]) -> io::Result<()>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }

    fn local_addr(&self) -> io::Result<Option<SocketAddr>> {
        Ok(None)
    }

    fn peer_addr(&self) -> io::Result<Option<SocketAddr>> {
        Ok(None)
    }

    /// `None` clears the deadline.
    fn set_read_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }
}

/// Connected stream socket driven by `SocketTransport`.
///
/// Mirrors the inherent methods std sockets already have, so the transport can
/// re-arm a per-syscall timeout before every read and write.
pub trait Socket {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    fn shutdown_both(&self) -> io::Result<()>;

    /// `None` for sockets without IP addresses.
    fn local_socket_addr(&self) -> Option<io::Result<SocketAddr>> {
        None
    }

    fn peer_socket_addr(&self) -> Option<io::Result<SocketAddr>> {
        None
    }
}

impl Socket for TcpStream {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream: &TcpStream = self;
        stream.read(buf)
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut stream: &TcpStream = self;
        stream.write(buf)
    }

    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }

    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(timeout)
    }

    fn shutdown_both(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn local_socket_addr(&self) -> Option<io::Result<SocketAddr>> {
        Some(self.local_addr())
    }

    fn peer_socket_addr(&self) -> Option<io::Result<SocketAddr>> {
        Some(self.peer_addr())
    }
}

#[cfg(unix)]
impl Socket for UnixStream {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream: &UnixStream = self;
        stream.read(buf)
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut stream: &UnixStream = self;
        stream.write(buf)
    }

    fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)
    }

    fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(timeout)
    }

    fn shutdown_both(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// Transport over a connected socket with absolute read and write deadlines.
///
/// A deadline bounds the whole `read_exact` / `write_all`, not each syscall:
/// the remaining time is recomputed before every syscall and the call fails
/// with `TimedOut` once the deadline has passed, even if data is pending.
/// A new deadline applies from the next syscall on.
///
/// A call that times out part-way may have consumed or sent part of a record.
pub struct SocketTransport<S> {
    socket: S,
    read_deadline: Mutex<Option<Instant>>,
    write_deadline: Mutex<Option<Instant>>,
}

impl<S: Socket> SocketTransport<S> {
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            read_deadline: Mutex::new(None),
            write_deadline: Mutex::new(None),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.socket
    }

    pub fn into_inner(self) -> S {
        self.socket
    }

    /// Arm the read timeout for one syscall. `Err(TimedOut)` once past the deadline.
    fn arm_read(&self) -> io::Result<()> {
        if let Some(deadline) = current(&self.read_deadline)? {
            self.socket.set_recv_timeout(Some(remaining(deadline)?))?;
        }
        Ok(())
    }

    fn arm_write(&self) -> io::Result<()> {
        if let Some(deadline) = current(&self.write_deadline)? {
            self.socket.set_send_timeout(Some(remaining(deadline)?))?;
        }
        Ok(())
    }
}

impl<S: Socket> From<S> for SocketTransport<S> {
    fn from(socket: S) -> Self {
        Self::new(socket)
    }
}

impl<S: Socket> Transport for SocketTransport<S> {
    fn read_exact(&self, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            self.arm_read()?;
            match self.socket.recv(buf) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "failed to fill whole buffer"));
                }
                Ok(n) => buf = &mut buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                // Re-checked against the deadline on the next turn.
                Err(e) if is_timeout(&e) && current(&self.read_deadline)?.is_some() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            self.arm_write()?;
            match self.socket.send(buf) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer"));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if is_timeout(&e) && current(&self.write_deadline)?.is_some() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::CLOSE | Capabilities::DEADLINE;
        if self.socket.local_socket_addr().is_some() {
            caps |= Capabilities::ADDRESS;
        }
        caps
    }

    fn close(&self) -> io::Result<()> {
        self.socket.shutdown_both()
    }

    fn local_addr(&self) -> io::Result<Option<SocketAddr>> {
        self.socket.local_socket_addr().transpose()
    }

    fn peer_addr(&self) -> io::Result<Option<SocketAddr>> {
        self.socket.peer_socket_addr().transpose()
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        *lock_deadline(&self.read_deadline)? = deadline;
        if deadline.is_none() {
            self.socket.set_recv_timeout(None)?;
        }
        Ok(())
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        *lock_deadline(&self.write_deadline)? = deadline;
        if deadline.is_none() {
            self.socket.set_send_timeout(None)?;
        }
        Ok(())
    }
}

/// Time left until `deadline`; `TimedOut` once it has passed.
fn remaining(deadline: Instant) -> io::Result<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|t| !t.is_zero())
        .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))
}

/// Socket timeouts surface as `WouldBlock` on unix and `TimedOut` on windows.
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn current(slot: &Mutex<Option<Instant>>) -> io::Result<Option<Instant>> {
    Ok(*lock_deadline(slot)?)
}

fn lock_deadline(slot: &Mutex<Option<Instant>>) -> io::Result<MutexGuard<'_, Option<Instant>>> {
    slot.lock().map_err(|_| poisoned())
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact(buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn close(&self) -> io::Result<()> {
        (**self).close()
    }

    fn local_addr(&self) -> io::Result<Option<SocketAddr>> {
        (**self).local_addr()
    }

    fn peer_addr(&self) -> io::Result<Option<SocketAddr>> {
        (**self).peer_addr()
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

/// Transport over an independent reader and writer, e.g. two pipe ends or an
/// in-memory `Cursor` / `Vec<u8>` pair. Supports no optional capabilities.
pub struct SplitTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

impl<R: Read, W: Write> SplitTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    pub fn lock_reader(&self) -> io::Result<MutexGuard<'_, R>> {
        self.reader.lock().map_err(|_| poisoned())
    }

    pub fn lock_writer(&self) -> io::Result<MutexGuard<'_, W>> {
        self.writer.lock().map_err(|_| poisoned())
    }

    pub fn into_inner(self) -> io::Result<(R, W)> {
        let reader = self.reader.into_inner().map_err(|_| poisoned())?;
        let writer = self.writer.into_inner().map_err(|_| poisoned())?;
        Ok((reader, writer))
    }
}

impl<R: Read, W: Write> Transport for SplitTransport<R, W> {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        self.lock_reader()?.read_exact(buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut writer = self.lock_writer()?;
        writer.write_all(buf)?;
        writer.flush()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "transport lock poisoned")
}
