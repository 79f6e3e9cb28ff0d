//! Storage ports for the uptime worker.
//!
//! - [`RecordStore`]: flat key-value collections of JSON records (checks).
//! - [`LogStore`]: append-only per-check audit streams and their archives.
//!
//! Each port ships a file-backed adapter used by the worker binary and an
//! in-memory adapter for tests and embedding.

pub mod error;
pub mod logs;
pub mod records;

pub use error::StoreError;
pub use logs::{FsLogStore, LogStore, MemoryLogStore};
pub use records::{FsRecordStore, MemoryRecordStore, RecordStore};
