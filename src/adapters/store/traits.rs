//! Record store abstraction traits
//!
//! This module defines the interface that record store adapters must implement
//! to feed records into an export run and receive the per-record outcomes.

use crate::domain::errors::StoreError;
use crate::domain::ids::RecordId;
use crate::domain::record::{ExportRecord, RecordState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Record store trait
///
/// The store owns the records. Packrat reads pending records and artifact
/// references from it and requests lifecycle transitions; it never deletes or
/// creates records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all records in the `Pending` state
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn fetch_pending_records(&self) -> StoreResult<Vec<ExportRecord>>;

    /// Fetch the path-like artifact references of a record
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordFetchFailure`] if the references cannot be
    /// read. The caller treats this as a per-record failure.
    async fn fetch_artifact_refs(&self, record_id: RecordId) -> StoreResult<Vec<String>>;

    /// Request `Pending | Errored -> Processing`
    async fn mark_processing(&self, record_id: RecordId) -> StoreResult<()>;

    /// Request `Processing -> Processed`
    async fn mark_processed(&self, record_id: RecordId) -> StoreResult<()>;

    /// Request `Processing -> Errored` with an aggregated message
    async fn mark_errored(&self, record_id: RecordId, message: &str) -> StoreResult<()>;

    /// Fetch every record regardless of state
    async fn get_all_records(&self) -> StoreResult<Vec<ExportRecord>>;
}

/// A record together with its artifact references, as kept by the bundled stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Record metadata and lifecycle state
    #[serde(flatten)]
    pub record: ExportRecord,

    /// Path-like artifact references
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl StoredRecord {
    /// Creates a stored record
    pub fn new(record: ExportRecord, artifacts: Vec<String>) -> Self {
        Self { record, artifacts }
    }

    /// Applies a lifecycle transition after validating it
    ///
    /// Moving to `Processing` or `Processed` clears any previous error message;
    /// moving to `Errored` stores the given message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] if the state machine does not
    /// allow the move.
    pub fn transition(&mut self, next: RecordState, message: Option<&str>) -> StoreResult<()> {
        let current = self.record.state;
        if !current.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                record_id: self.record.id.value(),
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        self.record.state = next;
        self.record.error_message = match next {
            RecordState::Errored => message.map(str::to_string),
            _ => None,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::AccountId;

    fn stored(state: RecordState) -> StoredRecord {
        let mut record = ExportRecord::new(
            RecordId::new(1),
            "invoice",
            AccountId::new("acct-1").unwrap(),
        );
        record.state = state;
        StoredRecord::new(record, vec!["/data/A.bin".to_string()])
    }

    #[test]
    fn test_transition_happy_path() {
        let mut rec = stored(RecordState::Pending);
        rec.transition(RecordState::Processing, None).unwrap();
        rec.transition(RecordState::Processed, None).unwrap();
        assert_eq!(rec.record.state, RecordState::Processed);
        assert!(rec.record.error_message.is_none());
    }

    #[test]
    fn test_transition_errored_keeps_message() {
        let mut rec = stored(RecordState::Processing);
        rec.transition(RecordState::Errored, Some("A.bin: missing"))
            .unwrap();
        assert_eq!(rec.record.state, RecordState::Errored);
        assert_eq!(rec.record.error_message.as_deref(), Some("A.bin: missing"));

        // Retrying clears the message
        rec.transition(RecordState::Processing, None).unwrap();
        assert!(rec.record.error_message.is_none());
    }

    #[test]
    fn test_transition_rejected() {
        let mut rec = stored(RecordState::Pending);
        let err = rec.transition(RecordState::Processed, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(rec.record.state, RecordState::Pending);
    }

    #[test]
    fn test_stored_record_json_shape() {
        let json = r#"{
            "id": 9,
            "record_type": "claim",
            "account_id": "acct-7",
            "state": "errored",
            "error_message": "previous failure",
            "artifacts": ["/srv/a/X.pdf"]
        }"#;
        let rec: StoredRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.record.id, RecordId::new(9));
        assert_eq!(rec.record.state, RecordState::Errored);
        assert_eq!(rec.artifacts, vec!["/srv/a/X.pdf".to_string()]);
    }
}
