//! Audit logger: one JSON line per evaluation, appended to the check's stream.

use std::sync::Arc;

use uptime_core::AuditRecord;
use uptime_store::{LogStore, StoreError};

/// Failure to record an evaluation. Never blocks state persistence.
#[derive(Debug, thiserror::Error)]
pub enum LogAppendError {
    #[error("Audit record is not serialisable: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Audit append failed: {0}")]
    Store(#[from] StoreError),
}

/// Appends [`AuditRecord`]s to per-check streams in a [`LogStore`].
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn LogStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Append `record` to the stream named `stream_id` (the check id).
    pub async fn append(
        &self,
        stream_id: &str,
        record: &AuditRecord,
    ) -> Result<(), LogAppendError> {
        let line = record.to_line()?;
        self.store.append(stream_id, &line).await?;
        Ok(())
    }
}
