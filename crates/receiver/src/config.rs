//! Sink option normalization.
//!
//! Options arrive from an external loader in a loose shape (byte counts
//! may be written as `"15m"` megabyte shorthand) and are resolved once
//! into an immutable [`SinkConfig`] per sink instance.

use std::path::PathBuf;

use serde::Deserialize;

use fileway_limiter::ProgressCallback;

use crate::error::SinkError;

/// Default per-file upload ceiling (~15 MB).
pub const DEFAULT_MAX_BYTES: u64 = 15_000_000;

/// Default destination root for relative identifiers.
pub const DEFAULT_DESTINATION_ROOT: &str = ".tmp/uploads";

/// Raw, not-yet-normalized sink options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinkOptions {
    /// Upload ceiling: integer bytes or `"<N>m"` megabyte shorthand.
    #[serde(default)]
    pub max_bytes: Option<MaxBytes>,
    /// Root directory that relative destination identifiers resolve
    /// against.
    #[serde(default)]
    pub destination_root: Option<PathBuf>,
}

/// A byte ceiling as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaxBytes {
    Bytes(u64),
    Shorthand(String),
}

/// Resolved sink configuration, immutable for the sink's lifetime.
pub struct SinkConfig {
    pub max_bytes: u64,
    pub destination_root: PathBuf,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            destination_root: PathBuf::from(DEFAULT_DESTINATION_ROOT),
            on_progress: None,
        }
    }
}

impl SinkConfig {
    /// Normalizes raw options into a config, applying defaults.
    pub fn resolve(options: SinkOptions) -> Result<Self, SinkError> {
        let max_bytes = match options.max_bytes {
            None => DEFAULT_MAX_BYTES,
            Some(MaxBytes::Bytes(n)) if n > 0 => n,
            Some(MaxBytes::Bytes(n)) => {
                return Err(SinkError::Config(format!(
                    "max_bytes must be positive, got {n}"
                )));
            }
            Some(MaxBytes::Shorthand(s)) => parse_max_bytes(&s).ok_or_else(|| {
                SinkError::Config(format!("unrecognized max_bytes value `{s}`"))
            })?,
        };

        Ok(Self {
            max_bytes,
            destination_root: options
                .destination_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION_ROOT)),
            on_progress: None,
        })
    }

    /// Attaches a progress callback invoked on every milestone.
    pub fn with_on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

/// Parses a byte-ceiling string: `"15m"` / `"15M"` means 15 MiB, a
/// plain integer is taken as bytes. Returns `None` for anything else
/// (including zero).
pub fn parse_max_bytes(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(megabytes) = s.strip_suffix(['m', 'M']) {
        let n: u64 = megabytes.parse().ok()?;
        (n > 0).then(|| n * 1024 * 1024)
    } else {
        let n: u64 = s.parse().ok()?;
        (n > 0).then_some(n)
    }
}
