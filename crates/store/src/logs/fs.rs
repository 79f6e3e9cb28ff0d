use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::LogStore;
use crate::error::{check_name, StoreError};

const STREAM_SUFFIX: &str = ".log";
const ARCHIVE_SUFFIX: &str = ".gz.b64";
const REWRITE_SUFFIX: &str = ".log.rewrite";

/// Streams at `{base_dir}/{id}.log`, archives at `{base_dir}/{id}.gz.b64`.
///
/// Clones share one write lock, so appends and stream rewrites from the
/// same process never interleave.
#[derive(Debug, Clone)]
pub struct FsLogStore {
    base_dir: PathBuf,
    writes: Arc<Mutex<()>>,
}

impl FsLogStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            writes: Arc::default(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn stream_path(&self, stream_id: &str) -> Result<PathBuf, StoreError> {
        check_name(stream_id)?;
        Ok(self.base_dir.join(format!("{stream_id}{STREAM_SUFFIX}")))
    }

    fn archive_path(&self, archive_id: &str) -> Result<PathBuf, StoreError> {
        check_name(archive_id)?;
        Ok(self.base_dir.join(format!("{archive_id}{ARCHIVE_SUFFIX}")))
    }
}

#[async_trait]
impl LogStore for FsLogStore {
    async fn append(&self, stream_id: &str, line: &str) -> Result<(), StoreError> {
        let path = self.stream_path(stream_id)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let _writing = self.writes.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list(&self, include_archived: bool) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = name.strip_suffix(STREAM_SUFFIX) {
                ids.push(id.to_string());
            } else if let Some(id) = name.strip_suffix(ARCHIVE_SUFFIX) {
                if include_archived {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read_raw(&self, stream_id: &str) -> Result<String, StoreError> {
        let path = self.stream_path(stream_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::StreamNotFound(stream_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn truncate(&self, stream_id: &str) -> Result<(), StoreError> {
        let path = self.stream_path(stream_id)?;
        let _writing = self.writes.lock().await;
        let file = match tokio::fs::OpenOptions::new().write(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::StreamNotFound(stream_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.set_len(0).await?;
        Ok(())
    }

    async fn discard_prefix(&self, stream_id: &str, len: usize) -> Result<(), StoreError> {
        let path = self.stream_path(stream_id)?;
        let _writing = self.writes.lock().await;

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::StreamNotFound(stream_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let rest = content.get(len..).unwrap_or_default();

        // Rewrite through a rename so a crash leaves either the old or the
        // new stream, never a partial one.
        let rewrite = self.base_dir.join(format!("{stream_id}{REWRITE_SUFFIX}"));
        tokio::fs::write(&rewrite, rest).await?;
        tokio::fs::rename(&rewrite, &path).await?;
        Ok(())
    }

    async fn write_archive(&self, archive_id: &str, encoded: &str) -> Result<(), StoreError> {
        let path = self.archive_path(archive_id)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::ArchiveExists(archive_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(archive_id, bytes = encoded.len(), "Archive written");
        Ok(())
    }

    async fn read_archive(&self, archive_id: &str) -> Result<String, StoreError> {
        let path = self.archive_path(archive_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::ArchiveNotFound(archive_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
