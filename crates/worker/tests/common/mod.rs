//! Shared fakes for the worker integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;
use uptime_core::{CheckDefinition, ProbeOutcome};
use uptime_notify::{AlertDispatcher, GatewayError, MessageGateway};
use uptime_store::{LogStore, MemoryLogStore, MemoryRecordStore, RecordStore, StoreError};
use uptime_worker::{AuditLogger, CheckScheduler, Prober};

pub const CHECK_ID: &str = "abc12345678901234567";
pub const OWNER_PHONE: &str = "5551234567";

/// A well-formed check record that has never been evaluated.
pub fn check_record(id: &str, success_codes: &[u16]) -> Value {
    json!({
        "id": id,
        "userPhone": OWNER_PHONE,
        "protocol": "http",
        "url": "example.com",
        "method": "get",
        "successCodes": success_codes,
        "timeoutSeconds": 3,
    })
}

// ---------------------------------------------------------------------------
// Probers
// ---------------------------------------------------------------------------

/// Returns pre-scripted outcomes in order, then `Timeout` forever.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Responds with each status code in turn.
    pub fn codes(codes: &[u16]) -> Self {
        Self::new(
            codes
                .iter()
                .map(|&response_code| ProbeOutcome::Success { response_code }),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _check: &CheckDefinition) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProbeOutcome::Timeout)
    }
}

/// Blocks every probe until [`release`](Self::release) is called.
#[derive(Default)]
pub struct GatedProber {
    pub started: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedProber {
    pub fn release(&self) {
        self.gate.notify_waiters();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for GatedProber {
    async fn probe(&self, _check: &CheckDefinition) -> ProbeOutcome {
        let released = self.gate.notified();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        released.await;
        ProbeOutcome::Success { response_code: 200 }
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(d, _)| d.clone()).collect()
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send(&self, destination: &str, message: &str) -> Result<(), GatewayError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Failing stores
// ---------------------------------------------------------------------------

/// Record store whose `update` always fails.
pub struct ReadOnlyRecords(pub MemoryRecordStore);

#[async_trait]
impl RecordStore for ReadOnlyRecords {
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.0.list(collection).await
    }
    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        self.0.read(collection, id).await
    }
    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _record: &Value,
    ) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }
}

/// Log store whose `append` always fails.
#[derive(Default)]
pub struct BrokenLogs;

#[async_trait]
impl LogStore for BrokenLogs {
    async fn append(&self, _stream_id: &str, _line: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }
    async fn list(&self, _include_archived: bool) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
    async fn read_raw(&self, stream_id: &str) -> Result<String, StoreError> {
        Err(StoreError::StreamNotFound(stream_id.to_string()))
    }
    async fn truncate(&self, stream_id: &str) -> Result<(), StoreError> {
        Err(StoreError::StreamNotFound(stream_id.to_string()))
    }
    async fn discard_prefix(&self, stream_id: &str, _len: usize) -> Result<(), StoreError> {
        Err(StoreError::StreamNotFound(stream_id.to_string()))
    }
    async fn write_archive(&self, _archive_id: &str, _encoded: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }
    async fn read_archive(&self, archive_id: &str) -> Result<String, StoreError> {
        Err(StoreError::ArchiveNotFound(archive_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness<P> {
    pub records: Arc<MemoryRecordStore>,
    pub logs: Arc<MemoryLogStore>,
    pub prober: Arc<P>,
    pub gateway: Arc<RecordingGateway>,
    pub scheduler: CheckScheduler,
}

impl<P: Prober + 'static> Harness<P> {
    pub fn new(prober: P) -> Self {
        let records = Arc::new(MemoryRecordStore::new());
        let logs = Arc::new(MemoryLogStore::new());
        let prober = Arc::new(prober);
        let gateway = Arc::new(RecordingGateway::default());
        let scheduler = CheckScheduler::new(
            records.clone(),
            AuditLogger::new(logs.clone()),
            prober.clone(),
            AlertDispatcher::new(gateway.clone()),
        );
        Self {
            records,
            logs,
            prober,
            gateway,
            scheduler,
        }
    }

    pub async fn stored(&self, id: &str) -> Value {
        self.records.read("checks", id).await.unwrap()
    }

    /// Parsed audit lines of one stream.
    pub async fn audit_lines(&self, id: &str) -> Vec<Value> {
        let raw = self.logs.read_raw(id).await.unwrap_or_default();
        raw.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}
