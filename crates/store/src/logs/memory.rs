use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::LogStore;
use crate::error::StoreError;

/// In-process log store. Names are listed in sorted order.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    streams: RwLock<BTreeMap<String, String>>,
    archives: RwLock<BTreeMap<String, String>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append(&self, stream_id: &str, line: &str) -> Result<(), StoreError> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(stream_id.to_string()).or_default();
        stream.push_str(line);
        stream.push('\n');
        Ok(())
    }

    async fn list(&self, include_archived: bool) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.streams.read().await.keys().cloned().collect();
        if include_archived {
            ids.extend(self.archives.read().await.keys().cloned());
            ids.sort();
        }
        Ok(ids)
    }

    async fn read_raw(&self, stream_id: &str) -> Result<String, StoreError> {
        self.streams
            .read()
            .await
            .get(stream_id)
            .cloned()
            .ok_or_else(|| StoreError::StreamNotFound(stream_id.to_string()))
    }

    async fn truncate(&self, stream_id: &str) -> Result<(), StoreError> {
        self.streams
            .write()
            .await
            .get_mut(stream_id)
            .map(String::clear)
            .ok_or_else(|| StoreError::StreamNotFound(stream_id.to_string()))
    }

    async fn discard_prefix(&self, stream_id: &str, len: usize) -> Result<(), StoreError> {
        let mut streams = self.streams.write().await;
        let stream = streams
            .get_mut(stream_id)
            .ok_or_else(|| StoreError::StreamNotFound(stream_id.to_string()))?;
        let rest = stream.get(len..).unwrap_or_default().to_string();
        *stream = rest;
        Ok(())
    }

    async fn write_archive(&self, archive_id: &str, encoded: &str) -> Result<(), StoreError> {
        let mut archives = self.archives.write().await;
        if archives.contains_key(archive_id) {
            return Err(StoreError::ArchiveExists(archive_id.to_string()));
        }
        archives.insert(archive_id.to_string(), encoded.to_string());
        Ok(())
    }

    async fn read_archive(&self, archive_id: &str) -> Result<String, StoreError> {
        self.archives
            .read()
            .await
            .get(archive_id)
            .cloned()
            .ok_or_else(|| StoreError::ArchiveNotFound(archive_id.to_string()))
    }
}
