//! Byte accounting and quota enforcement for streamed file uploads.
//!
//! This crate is the observer half of the upload pipeline: it counts
//! bytes as they move from a source stream towards durable storage,
//! keeps a per-file [`FileRecord`], emits [`ProgressMilestone`]
//! snapshots, and refuses to let a file grow past a configured byte
//! ceiling. It knows nothing about where bytes end up — the receiver
//! crate wires a [`QuotaTracker`] in front of whatever writer it opens.

mod progress;
mod record;
mod tracker;

pub use progress::{ProgressCallback, ProgressMilestone};
pub use record::{FileRecord, RecordStore};
pub use tracker::QuotaTracker;

/// Error returned when a file's running total surpasses its quota.
///
/// Terminal and non-retryable for that one file; other files admitted
/// to the same sink are unaffected.
#[derive(Debug, Clone, thiserror::Error)]
#[error("upload limit of {limit} bytes exceeded for `{id}` ({attempted} bytes attempted)")]
pub struct LimitExceeded {
    /// Destination identifier of the offending file.
    pub id: String,
    /// The configured ceiling in bytes.
    pub limit: u64,
    /// Running total including the rejected chunk.
    pub attempted: u64,
}
