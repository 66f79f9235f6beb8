use std::sync::Arc;

use tracing::debug;

use crate::record::RecordStore;
use crate::{LimitExceeded, ProgressMilestone};

/// Observes the byte path of exactly one file.
///
/// The tracker sits between a source stream and whatever writer the
/// receiver opened: every chunk is passed to [`observe`](Self::observe)
/// before it is forwarded downstream. It maintains the file's record
/// in the shared [`RecordStore`] and enforces the configured ceiling.
pub struct QuotaTracker {
    id: String,
    name: String,
    max_bytes: u64,
    declared_total: Option<u64>,
    records: Arc<RecordStore>,
}

impl QuotaTracker {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_bytes: u64,
        declared_total: Option<u64>,
        records: Arc<RecordStore>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_bytes,
            declared_total,
            records,
        }
    }

    /// Accounts for one chunk of `len` bytes.
    ///
    /// Returns the milestone for the updated running total, or
    /// [`LimitExceeded`] if the chunk would push the file past the
    /// ceiling — in which case the caller must not forward this chunk
    /// (or any later one) downstream. A total exactly equal to the
    /// ceiling is within quota.
    pub fn observe(&self, len: usize) -> Result<ProgressMilestone, LimitExceeded> {
        let written = self.records.add_bytes(&self.id, len as u64, self.declared_total);

        if written > self.max_bytes {
            debug!(
                id = %self.id,
                limit = self.max_bytes,
                attempted = written,
                "upload limit exceeded"
            );
            return Err(LimitExceeded {
                id: self.id.clone(),
                limit: self.max_bytes,
                attempted: written,
            });
        }

        Ok(ProgressMilestone::new(
            &self.id,
            &self.name,
            written,
            self.declared_total,
        ))
    }

    /// Destination identifier this tracker is bound to.
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(max: u64, declared: Option<u64>) -> (QuotaTracker, Arc<RecordStore>) {
        let records = Arc::new(RecordStore::new());
        let t = QuotaTracker::new("/tmp/out.bin", "out.bin", max, declared, Arc::clone(&records));
        (t, records)
    }

    #[test]
    fn under_limit_emits_milestones() {
        let (t, records) = tracker(1024, Some(500));

        let m1 = t.observe(250).unwrap();
        assert_eq!(m1.written, 250);
        assert_eq!(m1.percent, Some(50.0));

        let m2 = t.observe(250).unwrap();
        assert_eq!(m2.written, 500);
        assert_eq!(m2.percent, Some(100.0));

        assert_eq!(records.written("/tmp/out.bin"), Some(500));
    }

    #[test]
    fn exactly_at_limit_is_allowed() {
        let (t, _) = tracker(1024, None);
        let m = t.observe(1024).unwrap();
        assert_eq!(m.written, 1024);
    }

    #[test]
    fn one_byte_over_limit_is_rejected() {
        let (t, _) = tracker(1024, None);
        t.observe(1024).unwrap();
        let err = t.observe(1).unwrap_err();
        assert_eq!(err.limit, 1024);
        assert_eq!(err.attempted, 1025);
        assert_eq!(err.id, "/tmp/out.bin");
    }

    #[test]
    fn rejection_happens_mid_stream() {
        let (t, _) = tracker(1024, None);
        t.observe(500).unwrap();
        t.observe(500).unwrap();
        // Third chunk crosses the ceiling.
        let err = t.observe(500).unwrap_err();
        assert_eq!(err.attempted, 1500);
    }

    #[test]
    fn milestones_are_monotonic() {
        let (t, _) = tracker(u64::MAX, None);
        let mut last = 0;
        for len in [1usize, 10, 100, 0, 7] {
            let m = t.observe(len).unwrap();
            assert!(m.written >= last);
            last = m.written;
        }
    }

    #[test]
    fn trackers_for_different_files_are_independent() {
        let records = Arc::new(RecordStore::new());
        let a = QuotaTracker::new("/a", "a", 100, None, Arc::clone(&records));
        let b = QuotaTracker::new("/b", "b", 100, None, Arc::clone(&records));

        a.observe(100).unwrap();
        assert!(a.observe(1).is_err());
        // `b` is unaffected by `a` hitting its ceiling.
        assert_eq!(b.observe(100).unwrap().written, 100);
    }
}
