use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::RecordStore;
use crate::error::{check_name, StoreError};

const RECORD_EXT: &str = "json";

/// One JSON file per record at `{base_dir}/{collection}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    base_dir: PathBuf,
}

impl FsRecordStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        check_name(collection)?;
        check_name(id)?;
        Ok(self
            .base_dir
            .join(collection)
            .join(format!("{id}.{RECORD_EXT}")))
    }

    fn not_found(collection: &str, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        check_name(collection)?;
        let dir = self.base_dir.join(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Self::not_found(collection, id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn update(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(Self::not_found(collection, id));
        }

        // Write-then-rename keeps readers from ever seeing a half-written file.
        let tmp = path.with_extension(format!("{RECORD_EXT}.tmp"));
        tokio::fs::write(&tmp, serde_json::to_vec(record)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(collection, id, "Record updated");
        Ok(())
    }
}
