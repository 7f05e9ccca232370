// ## `mod.rs`: public facade + re-exports

//! stream: encrypted, authenticated record layer over any reliable byte channel.
//!
//! Layers, leaves first: `transport` (what we ride on), `framing` (length-prefixed
//! records), `config` (validated settings), `engine` (buffers, locks, codec).

pub mod config;
pub mod framing;
pub mod transport;
pub mod engine;

pub use config::{ConfigError, StreamConfig, StreamOptions};
pub use engine::EncryptedStream;
pub use transport::{Capabilities, Socket, SocketTransport, SplitTransport, Transport};
