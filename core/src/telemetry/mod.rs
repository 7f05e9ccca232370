//! telemetry/mod.rs
//! Per-stream record and byte counters plus immutable snapshots.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
