//! The receiver sink: admits one incoming file stream at a time and
//! pipes it through quota tracking into durable storage.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use fileway_limiter::{ProgressMilestone, QuotaTracker, RecordStore};

use crate::READ_BUFFER_SIZE;
use crate::config::SinkConfig;
use crate::destination::{Destination, DiskDestination};
use crate::error::SinkError;

/// Capacity of the sink event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One logical file handed to the sink for persistence: a byte source
/// plus the metadata the upstream demultiplexer attached to it.
pub struct IncomingFile {
    /// Readable byte source, owned by the sink for the duration of the
    /// transfer.
    pub source: Box<dyn AsyncRead + Send + Unpin>,
    /// Logical group the file belongs to (e.g. a form field name).
    pub field: String,
    /// Original filename as supplied by the uploader.
    pub filename: String,
    /// Destination identifier. Relative values resolve against the
    /// configured destination root.
    pub destination: Option<String>,
    /// Content length, when the source declared one in advance.
    pub declared_size: Option<u64>,
}

impl IncomingFile {
    pub fn new(
        source: impl AsyncRead + Send + Unpin + 'static,
        field: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            source: Box::new(source),
            field: field.into(),
            filename: filename.into(),
            destination: None,
            declared_size: None,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// A successfully persisted file.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub field: String,
    pub filename: String,
    /// Resolved destination identifier.
    pub destination: String,
    /// Final byte count on disk.
    pub byte_count: u64,
}

/// Event emitted on the sink's channel.
#[derive(Debug, Clone)]
pub enum SinkEvent {
    /// Progress update for the file currently being written.
    Progress(ProgressMilestone),
    /// A file reached durable storage.
    FileWritten(WrittenFile),
    /// A file's pipeline failed. The sink stays usable.
    Failed {
        destination: String,
        field: String,
        filename: String,
        error: String,
    },
}

/// Streaming file-persistence sink.
///
/// Admission is strictly sequential: [`admit`](Self::admit) borrows the
/// sink exclusively until the admitted file's pipeline reaches a
/// terminal state, so at most one destination writer is open per sink
/// and per-file failures need no locking to isolate.
///
/// Exactly one terminal event ([`SinkEvent::FileWritten`] or
/// [`SinkEvent::Failed`]) is emitted per admission.
pub struct ReceiverSink {
    config: SinkConfig,
    destination: Box<dyn Destination>,
    records: Arc<RecordStore>,
    events_tx: mpsc::Sender<SinkEvent>,
    events_rx: Option<mpsc::Receiver<SinkEvent>>,
}

impl ReceiverSink {
    /// Creates a sink that writes to the local filesystem.
    pub fn new(config: SinkConfig) -> Self {
        Self::with_destination(config, Box::new(DiskDestination))
    }

    /// Creates a sink over a custom [`Destination`].
    pub fn with_destination(config: SinkConfig, destination: Box<dyn Destination>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            destination,
            records: Arc::new(RecordStore::new()),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SinkEvent>> {
        self.events_rx.take()
    }

    /// Admits one incoming file and drives it to a terminal state.
    ///
    /// Returns the written-file summary on success. On failure the
    /// error is also emitted as [`SinkEvent::Failed`]; the sink remains
    /// able to admit subsequent files.
    pub async fn admit(&mut self, file: IncomingFile) -> Result<WrittenFile, SinkError> {
        let field = file.field.clone();
        let filename = file.filename.clone();
        let hint = file.destination.clone().unwrap_or_default();

        match self.pipeline(file).await {
            Ok(written) => {
                info!(
                    destination = %written.destination,
                    filename = %written.filename,
                    bytes = written.byte_count,
                    "file written"
                );
                let _ = self
                    .events_tx
                    .send(SinkEvent::FileWritten(written.clone()))
                    .await;
                Ok(written)
            }
            Err(err) => {
                warn!(field = %field, filename = %filename, error = %err, "file admission failed");
                let _ = self
                    .events_tx
                    .send(SinkEvent::Failed {
                        destination: hint,
                        field,
                        filename,
                        error: err.to_string(),
                    })
                    .await;
                Err(err)
            }
        }
    }

    /// Admits every file from `files` in order until the channel
    /// closes.
    ///
    /// Per-file failures are already reported on the event channel, so
    /// the loop keeps going past them.
    pub async fn drain(&mut self, mut files: mpsc::Receiver<IncomingFile>) {
        while let Some(file) = files.recv().await {
            let _ = self.admit(file).await;
        }
    }

    async fn pipeline(&mut self, mut file: IncomingFile) -> Result<WrittenFile, SinkError> {
        // Admission fails before any I/O if the identifier is unusable.
        let destination = match file.destination.as_deref() {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => {
                return Err(SinkError::InvalidDestination {
                    field: file.field,
                    filename: file.filename,
                    reason: "missing or empty".into(),
                });
            }
        };
        let path = self.resolve_destination(&destination, &file)?;

        if let Some(parent) = path.parent() {
            self.destination
                .ensure_container(parent)
                .await
                .map_err(|source| SinkError::ContainerCreation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let id = path.to_string_lossy().into_owned();
        let mut writer =
            self.destination
                .open(&path)
                .await
                .map_err(|source| SinkError::Write {
                    destination: id.clone(),
                    field: file.field.clone(),
                    source,
                })?;

        let tracker = QuotaTracker::new(
            &id,
            &file.filename,
            self.config.max_bytes,
            file.declared_size,
            Arc::clone(&self.records),
        );

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = file.source.read(&mut buf).await.map_err(|source| {
                warn!(filename = %file.filename, error = %source, "read error on incoming file");
                SinkError::SourceRead {
                    field: file.field.clone(),
                    filename: file.filename.clone(),
                    source,
                }
            })?;
            if n == 0 {
                break;
            }

            // Quota check happens before the chunk goes downstream.
            let milestone = tracker.observe(n)?;
            writer
                .write_chunk(&buf[..n])
                .await
                .map_err(|source| SinkError::Write {
                    destination: id.clone(),
                    field: file.field.clone(),
                    source,
                })?;

            if let Some(callback) = &self.config.on_progress {
                callback(milestone.clone());
            }
            // Progress is advisory; drop updates rather than stall the
            // byte path.
            let _ = self.events_tx.try_send(SinkEvent::Progress(milestone));
        }

        writer.finish().await.map_err(|source| SinkError::Write {
            destination: id.clone(),
            field: file.field.clone(),
            source,
        })?;

        let byte_count = match self.records.written(&id) {
            Some(n) => n,
            None => {
                // Zero-byte files never produce a record; report the
                // write anyway.
                debug!(
                    destination = %id,
                    filename = %file.filename,
                    field = %file.field,
                    "finished file has no record, reporting best-effort byte count"
                );
                0
            }
        };

        Ok(WrittenFile {
            field: file.field,
            filename: file.filename,
            destination: id,
            byte_count,
        })
    }

    fn resolve_destination(
        &self,
        destination: &str,
        file: &IncomingFile,
    ) -> Result<PathBuf, SinkError> {
        let path = Path::new(destination);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        validate_relative(destination).map_err(|reason| SinkError::InvalidDestination {
            field: file.field.clone(),
            filename: file.filename.clone(),
            reason,
        })?;
        Ok(self.config.destination_root.join(path))
    }
}

/// Relative identifiers must stay inside the destination root.
fn validate_relative(destination: &str) -> Result<(), String> {
    for component in Path::new(destination).components() {
        match component {
            Component::ParentDir => {
                return Err(format!(
                    "parent directory traversal not allowed: {destination}"
                ));
            }
            Component::Prefix(_) => {
                return Err(format!("path prefix not allowed: {destination}"));
            }
            Component::RootDir => {
                return Err(format!("absolute path not allowed: {destination}"));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}
