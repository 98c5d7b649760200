//! Export record domain model
//!
//! An [`ExportRecord`] is owned by the originating store. Packrat only reads it
//! and requests lifecycle transitions through the store.

use super::ids::{AccountId, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an export record
///
/// ```text
/// Pending -> Processing -> Processed
///                      \-> Errored -> Processing (re-run)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Waiting to be exported
    #[default]
    Pending,
    /// Picked up by a running export
    Processing,
    /// All artifacts captured in published archives
    Processed,
    /// At least one artifact could not be captured
    Errored,
}

impl RecordState {
    /// Returns true if a record may move from `self` to `next`
    pub fn can_transition_to(self, next: RecordState) -> bool {
        matches!(
            (self, next),
            (RecordState::Pending, RecordState::Processing)
                | (RecordState::Errored, RecordState::Processing)
                | (RecordState::Processing, RecordState::Processed)
                | (RecordState::Processing, RecordState::Errored)
        )
    }

    /// Returns true for Processed and Errored
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordState::Processed | RecordState::Errored)
    }

    /// Returns the lowercase state name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordState::Pending => "pending",
            RecordState::Processing => "processing",
            RecordState::Processed => "processed",
            RecordState::Errored => "errored",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RecordState::Pending),
            "processing" => Ok(RecordState::Processing),
            "processed" => Ok(RecordState::Processed),
            "errored" => Ok(RecordState::Errored),
            other => Err(format!(
                "Invalid record state '{other}'. Must be one of: pending, processing, processed, errored"
            )),
        }
    }
}

/// A logical record whose artifacts are to be exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Record identifier
    pub id: RecordId,

    /// Record type as known to the store (e.g. "invoice")
    pub record_type: String,

    /// Owning account
    pub account_id: AccountId,

    /// Current lifecycle state
    #[serde(default)]
    pub state: RecordState,

    /// Error message from the last failed export, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExportRecord {
    /// Creates a pending record
    pub fn new(id: RecordId, record_type: impl Into<String>, account_id: AccountId) -> Self {
        Self {
            id,
            record_type: record_type.into(),
            account_id,
            state: RecordState::Pending,
            error_message: None,
        }
    }
}

/// Outcome derived for one record at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Every contributing artifact was captured
    Processed,
    /// Something was not captured; the message lists what and why
    Errored { message: String },
}

impl RecordOutcome {
    /// Returns the terminal state this outcome maps to
    pub fn state(&self) -> RecordState {
        match self {
            RecordOutcome::Processed => RecordState::Processed,
            RecordOutcome::Errored { .. } => RecordState::Errored,
        }
    }

    /// Returns true for [`RecordOutcome::Processed`]
    pub fn is_processed(&self) -> bool {
        matches!(self, RecordOutcome::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_transitions() {
        assert!(RecordState::Pending.can_transition_to(RecordState::Processing));
        assert!(RecordState::Processing.can_transition_to(RecordState::Processed));
        assert!(RecordState::Processing.can_transition_to(RecordState::Errored));
        assert!(RecordState::Errored.can_transition_to(RecordState::Processing));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!RecordState::Pending.can_transition_to(RecordState::Processed));
        assert!(!RecordState::Pending.can_transition_to(RecordState::Errored));
        assert!(!RecordState::Processed.can_transition_to(RecordState::Processing));
        assert!(!RecordState::Processing.can_transition_to(RecordState::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RecordState::Processed.is_terminal());
        assert!(RecordState::Errored.is_terminal());
        assert!(!RecordState::Pending.is_terminal());
        assert!(!RecordState::Processing.is_terminal());
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!(RecordState::from_str("Pending").unwrap(), RecordState::Pending);
        assert_eq!(RecordState::from_str("errored").unwrap(), RecordState::Errored);
        assert!(RecordState::from_str("done").is_err());
    }

    #[test]
    fn test_record_deserialize_defaults_to_pending() {
        let json = r#"{"id": 3, "record_type": "invoice", "account_id": "acct-1"}"#;
        let record: ExportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, RecordId::new(3));
        assert_eq!(record.state, RecordState::Pending);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn test_outcome_state() {
        assert_eq!(RecordOutcome::Processed.state(), RecordState::Processed);
        let errored = RecordOutcome::Errored {
            message: "A.bin: missing".to_string(),
        };
        assert_eq!(errored.state(), RecordState::Errored);
        assert!(!errored.is_processed());
    }
}
