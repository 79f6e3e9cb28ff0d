//! Record store port: flat collections of JSON documents keyed by id.

mod fs;
mod memory;

pub use fs::FsRecordStore;
pub use memory::MemoryRecordStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// List/read/update contract the worker needs from the record store.
///
/// Each operation is atomic per id. No locking or versioning spans a
/// read-modify-write; the last writer wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Ids of every record in `collection`. A missing collection is empty.
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Read one record, or [`StoreError::NotFound`].
    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    /// Replace an existing record. Updating a missing record is
    /// [`StoreError::NotFound`].
    async fn update(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError>;
}
