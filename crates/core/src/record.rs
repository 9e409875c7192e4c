//! Record store collaborator interface.
//!
//! The host content-repository framework owns record storage; the
//! presentation engine only needs a narrow lookup seam. [`RecordStore`] is
//! that seam, and [`InMemoryRecordStore`] backs tests and the demo binary.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Snapshot of a host-managed record, taken at job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    /// Opaque record identifier as the host knows it.
    pub id: String,
    /// Host-defined record metadata, passed through to tasks untouched.
    pub metadata: serde_json::Value,
}

/// Lookup interface onto the host's record storage.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record snapshot, or [`CoreError::RecordNotFound`].
    async fn get_record(&self, record_id: &str) -> Result<RecordData, CoreError>;
}

/// Map-backed record store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, RecordData>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: RecordData) {
        self.records
            .write()
            .expect("record store lock poisoned")
            .insert(record.id.clone(), record);
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_record(&self, record_id: &str) -> Result<RecordData, CoreError> {
        self.records
            .read()
            .expect("record store lock poisoned")
            .get(record_id)
            .cloned()
            .ok_or_else(|| CoreError::RecordNotFound {
                id: record_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_inserted_record() {
        let store = InMemoryRecordStore::new();
        store.insert(RecordData {
            id: "R1".into(),
            metadata: serde_json::json!({ "title": "First record" }),
        });

        let record = store.get_record("R1").await.unwrap();
        assert_eq!(record.id, "R1");
        assert_eq!(record.metadata["title"], "First record");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = InMemoryRecordStore::new();
        let err = store.get_record("nope").await.unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound { .. }));
    }
}
