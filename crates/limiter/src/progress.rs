use serde::Serialize;

/// Callback invoked with each progress milestone.
pub type ProgressCallback = Box<dyn Fn(ProgressMilestone) + Send + Sync>;

/// Immutable snapshot of one file's transfer progress.
///
/// `total` and `percent` are present only when the source declared its
/// size in advance.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMilestone {
    /// Destination identifier.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Bytes written so far.
    pub written: u64,
    /// Declared total size, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// `written / total` as a percentage, if the total is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

impl ProgressMilestone {
    /// Builds a milestone for `written` bytes, deriving `percent` from
    /// the declared total when there is one.
    pub fn new(id: &str, name: &str, written: u64, total: Option<u64>) -> Self {
        let percent = total
            .filter(|t| *t > 0)
            .map(|t| written as f64 / t as f64 * 100.0);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            written,
            total,
            percent,
        }
    }
}
