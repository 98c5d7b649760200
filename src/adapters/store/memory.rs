//! In-memory record store
//!
//! Keeps records in process memory. Used for programmatic runs and tests; it
//! can be told to fail artifact lookups or state updates for given records.

use super::traits::{RecordStore, StoreResult, StoredRecord};
use crate::domain::errors::StoreError;
use crate::domain::ids::RecordId;
use crate::domain::record::{ExportRecord, RecordState};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    records: IndexMap<RecordId, StoredRecord>,
    failing_fetches: HashSet<RecordId>,
    failing_updates: HashSet<RecordId>,
    transitions: Vec<(RecordId, RecordState)>,
}

/// Record store backed by an in-memory map
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    state: RwLock<MemoryState>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|stored| (stored.record.id, stored))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                records,
                ..Default::default()
            }),
        }
    }

    /// Insert or replace a record
    pub async fn insert(&self, stored: StoredRecord) {
        let mut state = self.state.write().await;
        state.records.insert(stored.record.id, stored);
    }

    /// Make `fetch_artifact_refs` fail for a record
    pub async fn fail_fetch_for(&self, record_id: RecordId) {
        self.state.write().await.failing_fetches.insert(record_id);
    }

    /// Make every state update fail for a record
    pub async fn fail_updates_for(&self, record_id: RecordId) {
        self.state.write().await.failing_updates.insert(record_id);
    }

    /// Current copy of a record
    pub async fn get(&self, record_id: RecordId) -> Option<ExportRecord> {
        let state = self.state.read().await;
        state.records.get(&record_id).map(|s| s.record.clone())
    }

    /// States a record has been moved through, in order
    pub async fn transitions_for(&self, record_id: RecordId) -> Vec<RecordState> {
        let state = self.state.read().await;
        state
            .transitions
            .iter()
            .filter(|(id, _)| *id == record_id)
            .map(|(_, s)| *s)
            .collect()
    }

    async fn apply(
        &self,
        record_id: RecordId,
        next: RecordState,
        message: Option<&str>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if state.failing_updates.contains(&record_id) {
            return Err(StoreError::UpdateFailure {
                record_id: record_id.value(),
                message: "simulated update failure".to_string(),
            });
        }

        let stored = state
            .records
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound(record_id.value()))?;
        stored.transition(next, message)?;
        state.transitions.push((record_id, next));
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_pending_records(&self) -> StoreResult<Vec<ExportRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|s| s.record.state == RecordState::Pending)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn fetch_artifact_refs(&self, record_id: RecordId) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;

        if state.failing_fetches.contains(&record_id) {
            return Err(StoreError::RecordFetchFailure {
                record_id: record_id.value(),
                message: "simulated fetch failure".to_string(),
            });
        }

        state
            .records
            .get(&record_id)
            .map(|s| s.artifacts.clone())
            .ok_or_else(|| StoreError::RecordFetchFailure {
                record_id: record_id.value(),
                message: "record not found".to_string(),
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
        let state = self.state.read().await;
        Ok(state.records.values().map(|s| s.record.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::AccountId;

    fn stored(id: i64, state: RecordState, artifacts: &[&str]) -> StoredRecord {
        let mut record = ExportRecord::new(
            RecordId::new(id),
            "invoice",
            AccountId::new("acct-1").unwrap(),
        );
        record.state = state;
        StoredRecord::new(record, artifacts.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_fetch_pending_filters_by_state() {
        let store = InMemoryRecordStore::with_records([
            stored(1, RecordState::Pending, &["/d/A.bin"]),
            stored(2, RecordState::Processed, &["/d/B.bin"]),
            stored(3, RecordState::Pending, &[]),
        ]);

        let pending = store.fetch_pending_records().await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_fetch_artifact_refs() {
        let store =
            InMemoryRecordStore::with_records([stored(1, RecordState::Pending, &["/d/A.bin"])]);

        let refs = store.fetch_artifact_refs(RecordId::new(1)).await.unwrap();
        assert_eq!(refs, vec!["/d/A.bin".to_string()]);

        let missing = store.fetch_artifact_refs(RecordId::new(99)).await;
        assert!(matches!(
            missing,
            Err(StoreError::RecordFetchFailure { record_id: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_fetch_failure() {
        let store =
            InMemoryRecordStore::with_records([stored(1, RecordState::Pending, &["/d/A.bin"])]);
        store.fail_fetch_for(RecordId::new(1)).await;

        assert!(store.fetch_artifact_refs(RecordId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_lifecycle_transitions_are_recorded() {
        let store = InMemoryRecordStore::with_records([stored(1, RecordState::Pending, &[])]);
        let id = RecordId::new(1);

        store.mark_processing(id).await.unwrap();
        store.mark_errored(id, "A.bin: missing").await.unwrap();

        let record = store.get(id).await.unwrap();
        assert_eq!(record.state, RecordState::Errored);
        assert_eq!(record.error_message.as_deref(), Some("A.bin: missing"));
        assert_eq!(
            store.transitions_for(id).await,
            vec![RecordState::Processing, RecordState::Errored]
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let store = InMemoryRecordStore::with_records([stored(1, RecordState::Pending, &[])]);

        let result = store.mark_processed(RecordId::new(1)).await;
        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_injected_update_failure() {
        let store = InMemoryRecordStore::with_records([stored(1, RecordState::Pending, &[])]);
        store.fail_updates_for(RecordId::new(1)).await;

        let result = store.mark_processing(RecordId::new(1)).await;
        assert!(matches!(result, Err(StoreError::UpdateFailure { .. })));
        assert_eq!(
            store.get(RecordId::new(1)).await.unwrap().state,
            RecordState::Pending
        );
    }
}
