//! Receiver error types.

use std::path::PathBuf;

use fileway_limiter::LimitExceeded;

/// Errors produced while admitting a file.
///
/// Every variant is scoped to a single file; none of them poisons the
/// sink, which stays able to admit subsequent files.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("invalid destination identifier for `{filename}` (field `{field}`): {reason}")]
    InvalidDestination {
        field: String,
        filename: String,
        reason: String,
    },

    #[error("failed to create destination directory {}: {source}", .path.display())]
    ContainerCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read error on `{filename}` (field `{field}`): {source}")]
    SourceRead {
        field: String,
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    LimitExceeded(#[from] LimitExceeded),

    #[error("error writing `{destination}` (field `{field}`): {source}")]
    Write {
        destination: String,
        field: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
