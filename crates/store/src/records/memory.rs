use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::error::StoreError;

/// In-process record store. Ids are listed in sorted order.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a record, bypassing the update-must-exist rule.
    pub async fn insert(&self, collection: &str, id: &str, record: Value) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    pub async fn remove(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|c| c.remove(id))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn update(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        *slot = record.clone();
        Ok(())
    }
}
