//! Destination abstraction and the local-disk implementation.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A boxed future returned by destination methods.
pub type DestinationFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, std::io::Error>> + Send + 'a>>;

/// A durable, append-only write target for one file.
///
/// Writers know nothing about quotas or file records; they are plain
/// sequential sinks the receiver pumps chunks into.
pub trait FileWriter: Send {
    /// Appends one chunk.
    fn write_chunk<'a>(&'a mut self, chunk: &'a [u8]) -> DestinationFuture<'a, ()>;

    /// Completes the write. Resolves only once all buffered bytes are
    /// durably flushed; any error means the destination content is not
    /// trustworthy.
    fn finish<'a>(&'a mut self) -> DestinationFuture<'a, ()>;
}

/// Abstraction over the storage backing a sink.
pub trait Destination: Send + Sync {
    /// Ensures the container (parent directory/namespace) for a
    /// destination exists.
    fn ensure_container<'a>(&'a self, dir: &'a Path) -> DestinationFuture<'a, ()>;

    /// Opens a writer for the given destination path.
    fn open<'a>(&'a self, path: &'a Path) -> DestinationFuture<'a, Box<dyn FileWriter>>;
}

/// Local-filesystem destination.
pub struct DiskDestination;

impl Destination for DiskDestination {
    fn ensure_container<'a>(&'a self, dir: &'a Path) -> DestinationFuture<'a, ()> {
        Box::pin(fs::create_dir_all(dir))
    }

    fn open<'a>(&'a self, path: &'a Path) -> DestinationFuture<'a, Box<dyn FileWriter>> {
        Box::pin(async move {
            let file = fs::File::create(path).await?;
            Ok(Box::new(DiskWriter { file }) as Box<dyn FileWriter>)
        })
    }
}

struct DiskWriter {
    file: fs::File,
}

impl FileWriter for DiskWriter {
    fn write_chunk<'a>(&'a mut self, chunk: &'a [u8]) -> DestinationFuture<'a, ()> {
        Box::pin(self.file.write_all(chunk))
    }

    fn finish<'a>(&'a mut self) -> DestinationFuture<'a, ()> {
        Box::pin(async move {
            self.file.flush().await?;
            self.file.sync_all().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_container_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");

        DiskDestination.ensure_container(&dir).await.unwrap();
        assert!(dir.is_dir());

        // Idempotent.
        DiskDestination.ensure_container(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn writes_chunks_sequentially() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.bin");

        let mut writer = DiskDestination.open(&path).await.unwrap();
        writer.write_chunk(b"Hello").await.unwrap();
        writer.write_chunk(b" World").await.unwrap();
        writer.finish().await.unwrap();

        let content = std::fs::read(&path).unwrap();
        assert_eq!(&content, b"Hello World");
    }

    #[tokio::test]
    async fn open_truncates_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.bin");
        std::fs::write(&path, b"previous content").unwrap();

        let mut writer = DiskDestination.open(&path).await.unwrap();
        writer.write_chunk(b"new").await.unwrap();
        writer.finish().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn open_fails_without_container() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing/dir/out.bin");
        assert!(DiskDestination.open(&path).await.is_err());
    }
}
