use std::sync::RwLock;

/// Per-file bookkeeping entry correlating a running byte count to a
/// destination identifier.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Destination identifier (resolved path string).
    pub id: String,
    /// Bytes observed so far.
    pub written: u64,
    /// Declared total size, if the source announced one up front.
    pub total: Option<u64>,
}

/// Ordered collection of [`FileRecord`]s for one sink (thread-safe).
///
/// Records are created lazily on the first observed chunk, so a
/// zero-byte file never gets one — the receiver treats that as a
/// non-fatal lookup miss at completion time. Records are never
/// removed; the store lives exactly as long as its sink.
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: RwLock<Vec<FileRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `len` bytes to the record for `id`, creating the record if
    /// this is the first chunk. Returns the running total after the
    /// increment.
    pub fn add_bytes(&self, id: &str, len: u64, declared_total: Option<u64>) -> u64 {
        let mut records = self.inner.write().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.written += len;
                record.written
            }
            None => {
                records.push(FileRecord {
                    id: id.to_string(),
                    written: len,
                    total: declared_total,
                });
                len
            }
        }
    }

    /// Returns the running total for `id`, or `None` if no chunk was
    /// ever observed for it.
    pub fn written(&self, id: &str) -> Option<u64> {
        let records = self.inner.read().unwrap();
        records.iter().find(|r| r.id == id).map(|r| r.written)
    }

    /// Declared total for `id`, if any.
    pub fn total(&self, id: &str) -> Option<u64> {
        let records = self.inner.read().unwrap();
        records.iter().find(|r| r.id == id).and_then(|r| r.total)
    }

    /// Number of files that have produced at least one chunk.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_chunk_creates_record() {
        let store = RecordStore::new();
        assert!(store.written("a").is_none());

        let total = store.add_bytes("a", 250, Some(500));
        assert_eq!(total, 250);
        assert_eq!(store.written("a"), Some(250));
        assert_eq!(store.total("a"), Some(500));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn later_chunks_accumulate() {
        let store = RecordStore::new();
        store.add_bytes("a", 250, None);
        let total = store.add_bytes("a", 250, None);
        assert_eq!(total, 500);
        assert_eq!(store.written("a"), Some(500));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn records_are_keyed_by_id() {
        let store = RecordStore::new();
        store.add_bytes("a", 100, None);
        store.add_bytes("b", 200, None);
        assert_eq!(store.written("a"), Some(100));
        assert_eq!(store.written("b"), Some(200));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn zero_byte_file_has_no_record() {
        let store = RecordStore::new();
        assert!(store.written("never-seen").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn declared_total_only_set_at_creation() {
        let store = RecordStore::new();
        store.add_bytes("a", 10, Some(100));
        store.add_bytes("a", 10, Some(999));
        assert_eq!(store.total("a"), Some(100));
    }
}
