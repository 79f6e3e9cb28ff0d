//! Log rotation: compacts every active audit stream into an archive.
//!
//! Per stream: read -> gzip+base64 (blocking pool) -> write `{id}-{millis}`
//! archive -> discard the archived bytes. Only the prefix that went into the
//! archive is removed, so lines appended while the archive was being written
//! stay in the stream. A failure at any step leaves the stream in place.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uptime_core::types::now_millis;
use uptime_store::{LogStore, StoreError};

use crate::archive::{self, ArchiveError};
use crate::lifecycle::WorkerHandle;

/// Default time between rotation passes.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("Failed to read stream: {0}")]
    ReadStream(StoreError),

    #[error("Failed to encode archive: {0}")]
    Encode(ArchiveError),

    #[error("Failed to write archive: {0}")]
    WriteArchive(StoreError),

    #[error("Archive written but stream not truncated: {0}")]
    Truncate(StoreError),

    #[error("Failed to read archive: {0}")]
    ReadArchive(StoreError),

    #[error("Failed to decode archive: {0}")]
    Decode(ArchiveError),

    #[error("Codec task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What happened to one stream during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRotation {
    Archived { archive_id: String },
    /// Nothing to archive.
    Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationSummary {
    pub listed: usize,
    pub archived: usize,
    pub empty: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct RotationManager {
    store: Arc<dyn LogStore>,
    interval: Duration,
}

impl RotationManager {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_ROTATION_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the interval loop. The first pass runs immediately.
    pub fn spawn(self) -> WorkerHandle {
        WorkerHandle::spawn("log rotation", move |cancel| async move {
            self.run(cancel).await;
        })
    }

    /// Run rotation passes until `cancel` is triggered. A pass already in
    /// progress is finished before the loop exits.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "Log rotation started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Log rotation stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.rotate_all().await;
                }
            }
        }
    }

    /// Rotate every active stream concurrently. One stream failing does not
    /// affect the others.
    pub async fn rotate_all(&self) -> RotationSummary {
        let streams = match self.store.list(false).await {
            Ok(streams) => streams,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list log streams");
                return RotationSummary::default();
            }
        };

        let mut summary = RotationSummary {
            listed: streams.len(),
            ..Default::default()
        };

        let results = join_all(streams.iter().map(|id| self.rotate_stream(id))).await;
        for (id, result) in streams.iter().zip(results) {
            match result {
                Ok(StreamRotation::Archived { archive_id }) => {
                    tracing::debug!(stream_id = %id, %archive_id, "Stream archived");
                    summary.archived += 1;
                }
                Ok(StreamRotation::Empty) => summary.empty += 1,
                Err(e) => {
                    tracing::error!(stream_id = %id, error = %e, "Failed to rotate stream");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            listed = summary.listed,
            archived = summary.archived,
            empty = summary.empty,
            failed = summary.failed,
            "Log rotation pass complete",
        );
        summary
    }

    pub async fn rotate_stream(&self, stream_id: &str) -> Result<StreamRotation, RotationError> {
        let content = self
            .store
            .read_raw(stream_id)
            .await
            .map_err(RotationError::ReadStream)?;
        if content.is_empty() {
            return Ok(StreamRotation::Empty);
        }
        let archived_len = content.len();

        let encoded = tokio::task::spawn_blocking(move || archive::compress(&content))
            .await?
            .map_err(RotationError::Encode)?;

        let archive_id = format!("{stream_id}-{}", now_millis());
        self.store
            .write_archive(&archive_id, &encoded)
            .await
            .map_err(RotationError::WriteArchive)?;
        self.store
            .discard_prefix(stream_id, archived_len)
            .await
            .map_err(RotationError::Truncate)?;

        Ok(StreamRotation::Archived { archive_id })
    }

    /// Decode an archive back to the exact stream content it was made from.
    pub async fn read_archive(&self, archive_id: &str) -> Result<String, RotationError> {
        let encoded = self
            .store
            .read_archive(archive_id)
            .await
            .map_err(RotationError::ReadArchive)?;
        tokio::task::spawn_blocking(move || archive::decompress(&encoded))
            .await?
            .map_err(RotationError::Decode)
    }

    /// Ids of every archive in the store.
    pub async fn list_archives(&self) -> Result<Vec<String>, StoreError> {
        let active = self.store.list(false).await?;
        let mut all = self.store.list(true).await?;
        all.retain(|id| !active.contains(id));
        Ok(all)
    }
}
