use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::StoreError;

/// One ledger entry per caller-supplied operation key.
///
/// A record exists from the first time a key is seen; `used` flips to true
/// only after the guarded operation has durably committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub used: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(key: String, metadata: serde_json::Value) -> Self {
        Self {
            key,
            used: false,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Ledger collapsing duplicate attempts of a keyed operation into one effect.
///
/// Callers wanting at-most-once execution must follow the ordering:
/// `find` -> short-circuit if used; `create` if absent; execute; `mark_used`
/// only after the operation's effects are durably committed.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn find(&self, key: &str) -> Result<Option<IdempotencyRecord>, StoreError>;

    /// First writer wins: an existing record is never overwritten. Returns
    /// the record now stored under the key, whether created here or not.
    async fn create(
        &self,
        key: &str,
        metadata: serde_json::Value,
    ) -> Result<IdempotencyRecord, StoreError>;

    /// Idempotent; repeated calls are harmless. Unknown keys are a no-op.
    async fn mark_used(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory ledger for tests and local development.
pub struct MemoryIdempotencyStore {
    records: Mutex<HashMap<String, IdempotencyRecord>>,
}

impl MemoryIdempotencyStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryIdempotencyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn find(&self, key: &str) -> Result<Option<IdempotencyRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.get(key).cloned())
    }

    async fn create(
        &self,
        key: &str,
        metadata: serde_json::Value,
    ) -> Result<IdempotencyRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(key.to_string())
            .or_insert_with(|| IdempotencyRecord::new(key.to_string(), metadata));
        Ok(record.clone())
    }

    async fn mark_used(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(key) {
            record.used = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_writer_wins() {
        let store = MemoryIdempotencyStore::new();

        let first = store
            .create("tool-call-1", serde_json::json!({"attempt": 1}))
            .await
            .unwrap();
        let second = store
            .create("tool-call-1", serde_json::json!({"attempt": 2}))
            .await
            .unwrap();

        assert_eq!(first.metadata, second.metadata);
        assert_eq!(second.metadata["attempt"], 1);
    }

    #[tokio::test]
    async fn test_mark_used_is_idempotent() {
        let store = MemoryIdempotencyStore::new();
        store
            .create("tool-call-2", serde_json::Value::Null)
            .await
            .unwrap();

        store.mark_used("tool-call-2").await.unwrap();
        store.mark_used("tool-call-2").await.unwrap();

        let record = store.find("tool-call-2").await.unwrap().unwrap();
        assert!(record.used);

        // Unknown key is a no-op, not an error
        store.mark_used("never-created").await.unwrap();
        assert!(store.find("never-created").await.unwrap().is_none());
    }
}
