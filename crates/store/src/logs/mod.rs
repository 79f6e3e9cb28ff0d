//! Log store port: append-only audit streams plus immutable archives.

mod fs;
mod memory;

pub use fs::FsLogStore;
pub use memory::MemoryLogStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// Contract the audit logger and rotation manager need from the log store.
///
/// Streams are named by check id. Archives are named `{streamId}-{millis}`
/// and hold already-encoded text; the store never interprets either.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append `line` plus a trailing newline, creating the stream if needed.
    async fn append(&self, stream_id: &str, line: &str) -> Result<(), StoreError>;

    /// Active stream ids, plus archive ids when `include_archived` is set.
    async fn list(&self, include_archived: bool) -> Result<Vec<String>, StoreError>;

    /// Full content of an active stream.
    async fn read_raw(&self, stream_id: &str) -> Result<String, StoreError>;

    /// Empty an active stream without removing it.
    async fn truncate(&self, stream_id: &str) -> Result<(), StoreError>;

    /// Drop the first `len` bytes of an active stream, keeping anything
    /// appended after them. Must not interleave with a concurrent `append`.
    async fn discard_prefix(&self, stream_id: &str, len: usize) -> Result<(), StoreError>;

    /// Create a new archive. Fails with [`StoreError::ArchiveExists`] rather
    /// than overwrite.
    async fn write_archive(&self, archive_id: &str, encoded: &str) -> Result<(), StoreError>;

    /// Encoded content of an archive.
    async fn read_archive(&self, archive_id: &str) -> Result<String, StoreError>;
}
