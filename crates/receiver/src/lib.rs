//! Streaming file-persistence sink.
//!
//! Accepts a sequence of independently-sourced byte streams, writes
//! each one to durable storage under its destination identifier, and
//! reports progress, completion and failure as events.
//!
//! # Pipeline
//!
//! 1. **Admit** — validate and resolve the destination identifier
//! 2. **Prepare** — ensure the destination directory exists
//! 3. **Pump** — source → quota tracker → destination writer
//! 4. **Finalize** — flush durably, correlate the file record, emit
//!    `FileWritten`
//!
//! One file is in flight per sink at a time; a failed file never stops
//! the sink from admitting the next one.

pub mod config;
pub mod destination;
pub mod error;
pub mod sink;

pub use config::{DEFAULT_MAX_BYTES, SinkConfig, SinkOptions, parse_max_bytes};
pub use destination::{Destination, DiskDestination, FileWriter};
pub use error::SinkError;
pub use sink::{IncomingFile, ReceiverSink, SinkEvent, WrittenFile};

/// Read buffer size for the source → destination pump (64 KB).
pub const READ_BUFFER_SIZE: usize = 64 * 1024;
