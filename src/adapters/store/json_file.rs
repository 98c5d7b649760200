//! JSON file record store
//!
//! Reads records and their artifact references from a JSON document and
//! writes every state change back to it. The file is replaced through a
//! temporary sibling and a rename, so a crash mid-write never truncates it.
//!
//! ```json
//! {
//!   "records": [
//!     {
//!       "id": 1,
//!       "record_type": "invoice",
//!       "account_id": "acct-001",
//!       "state": "pending",
//!       "artifacts": ["/srv/scans/A.bin", "/srv/scans/B.bin"]
//!     }
//!   ]
//! }
//! ```

use super::traits::{RecordStore, StoreResult, StoredRecord};
use crate::domain::errors::StoreError;
use crate::domain::ids::RecordId;
use crate::domain::record::{ExportRecord, RecordState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk document layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsDocument {
    /// All records known to the store
    #[serde(default)]
    pub records: Vec<StoredRecord>,
}

/// Record store persisted as a single JSON file
pub struct JsonFileRecordStore {
    path: PathBuf,
    document: Mutex<RecordsDocument>,
}

impl JsonFileRecordStore {
    /// Open a records file
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the file cannot be read or
    /// parsed, or if it contains duplicate record IDs.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to read records file {}: {}",
                path.display(),
                e
            ))
        })?;

        let document: RecordsDocument = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to parse records file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut seen = std::collections::HashSet::new();
        for stored in &document.records {
            if !seen.insert(stored.record.id) {
                return Err(StoreError::Persistence(format!(
                    "Duplicate record id {} in {}",
                    stored.record.id,
                    path.display()
                )));
            }
        }

        tracing::debug!(
            path = %path.display(),
            records = document.records.len(),
            "Opened records file"
        );

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn apply(
        &self,
        record_id: RecordId,
        next: RecordState,
        message: Option<&str>,
    ) -> StoreResult<()> {
        let mut document = self.document.lock().await;

        let stored = document
            .records
            .iter_mut()
            .find(|s| s.record.id == record_id)
            .ok_or(StoreError::NotFound(record_id.value()))?;

        let previous = stored.clone();
        stored.transition(next, message)?;

        if let Err(e) = self.persist(&document).await {
            // Keep memory consistent with what is on disk
            if let Some(slot) = document
                .records
                .iter_mut()
                .find(|s| s.record.id == record_id)
            {
                *slot = previous;
            }
            return Err(StoreError::UpdateFailure {
                record_id: record_id.value(),
                message: e.to_string(),
            });
        }

        Ok(())
    }

    async fn persist(&self, document: &RecordsDocument) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, contents.as_bytes()))
            .await
            .map_err(|e| StoreError::Persistence(format!("store writer panicked: {e}")))?
    }
}

/// Replace `path` with `contents` through a synced temporary sibling
fn write_atomically(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".records.")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StoreError::Persistence(format!("Failed to create temp file: {e}")))?;

    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| StoreError::Persistence(format!("Failed to write records: {e}")))?;

    temp.persist(path).map_err(|e| {
        StoreError::Persistence(format!(
            "Failed to replace {}: {}",
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn fetch_pending_records(&self) -> StoreResult<Vec<ExportRecord>> {
        let document = self.document.lock().await;
        Ok(document
            .records
            .iter()
            .filter(|s| s.record.state == RecordState::Pending)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn fetch_artifact_refs(&self, record_id: RecordId) -> StoreResult<Vec<String>> {
        let document = self.document.lock().await;
        document
            .records
            .iter()
            .find(|s| s.record.id == record_id)
            .map(|s| s.artifacts.clone())
            .ok_or_else(|| StoreError::RecordFetchFailure {
                record_id: record_id.value(),
                message: "record not found in records file".to_string(),
            })
    }

    async fn mark_processing(&self, record_id: RecordId) -> StoreResult<()> {
        self.apply(record_id, RecordState::Processing, None).await
    }

    async fn mark_processed(&self, record_id: RecordId) -> StoreResult<()> {
        self.apply(record_id, RecordState::Processed, None).await
    }

    async fn mark_errored(&self, record_id: RecordId, message: &str) -> StoreResult<()> {
        self.apply(record_id, RecordState::Errored, Some(message))
            .await
    }

    async fn get_all_records(&self) -> StoreResult<Vec<ExportRecord>> {
        let document = self.document.lock().await;
        Ok(document.records.iter().map(|s| s.record.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECORDS: &str = r#"{
  "records": [
    {"id": 1, "record_type": "invoice", "account_id": "acct-1", "state": "pending",
     "artifacts": ["/srv/a/A.bin", "/srv/a/B.bin"]},
    {"id": 2, "record_type": "invoice", "account_id": "acct-2", "state": "processed",
     "artifacts": []}
  ]
}"#;

    async fn open_store(dir: &TempDir) -> JsonFileRecordStore {
        let path = dir.path().join("records.json");
        std::fs::write(&path, RECORDS).unwrap();
        JsonFileRecordStore::open(&path).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_and_fetch_pending() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let pending = store.fetch_pending_records().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, RecordId::new(1));

        let refs = store.fetch_artifact_refs(RecordId::new(1)).await.unwrap();
        assert_eq!(refs.len(), 2);
    }

    #[tokio::test]
    async fn test_state_changes_are_persisted() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let id = RecordId::new(1);

        store.mark_processing(id).await.unwrap();
        store.mark_errored(id, "B.bin: missing").await.unwrap();

        let reopened = JsonFileRecordStore::open(store.path()).await.unwrap();
        let all = reopened.get_all_records().await.unwrap();
        let record = all.iter().find(|r| r.id == id).unwrap();
        assert_eq!(record.state, RecordState::Errored);
        assert_eq!(record.error_message.as_deref(), Some("B.bin: missing"));

        // No temp files left next to the records file
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = JsonFileRecordStore::open(dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"{"records": [
                {"id": 1, "record_type": "a", "account_id": "x"},
                {"id": 1, "record_type": "b", "account_id": "y"}
            ]}"#,
        )
        .unwrap();

        assert!(JsonFileRecordStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_record_update() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let result = store.mark_processing(RecordId::new(42)).await;
        assert_eq!(result, Err(StoreError::NotFound(42)));
    }
}
