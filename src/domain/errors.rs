//! Domain error types
//!
//! This module defines the error hierarchy for Packrat. Errors fall into three
//! groups that are handled very differently by the pipeline:
//!
//! - [`SkipReason`] - per-artifact problems, absorbed into the batch result
//! - [`ArchiveError`] - per-batch problems, absorbed into the pipeline result
//! - [`PackratError`] - configuration and programmer errors, returned as `Err`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main Packrat error type
///
/// Only configuration problems and failures outside the data path surface as
/// this type. Everything that can go wrong while building archives ends up in
/// the structured pipeline result instead.
#[derive(Debug, Error)]
pub enum PackratError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Archive errors raised outside a batch (e.g. verification helpers)
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Record store errors
///
/// Errors returned by [`RecordStore`](crate::adapters::store::RecordStore)
/// implementations. They never expose the backing storage's own error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Fetching the artifact references of a record failed
    #[error("Failed to fetch artifact references for record {record_id}: {message}")]
    RecordFetchFailure { record_id: i64, message: String },

    /// A state update was rejected or could not be written
    #[error("Failed to update record {record_id}: {message}")]
    UpdateFailure { record_id: i64, message: String },

    /// Record does not exist in the store
    #[error("Record not found: {0}")]
    NotFound(i64),

    /// Requested lifecycle transition is not allowed
    #[error("Invalid state transition for record {record_id}: {from} -> {to}")]
    InvalidTransition {
        record_id: i64,
        from: String,
        to: String,
    },

    /// Backing storage could not be read or written
    #[error("Store persistence failed: {0}")]
    Persistence(String),
}

/// Reason an individual artifact was left out of its archive
///
/// Skips are partial, non-fatal conditions: the batch continues and the
/// affected records are reported as errored.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Source file does not exist
    #[error("artifact missing at {path}")]
    ArtifactMissing { path: String },

    /// Source exists but is empty or not a regular file
    #[error("artifact empty at {path}")]
    ArtifactEmpty { path: String },

    /// Source could not be read
    #[error("artifact unreadable at {path}: {message}")]
    ArtifactReadFailure { path: String, message: String },
}

/// Batch-level archive failures
///
/// Any of these fails the whole batch. The final archive path is never
/// created when one of them occurs before publishing.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ArchiveError {
    /// Temporary archive could not be created (or the final path is taken)
    #[error("failed to create archive: {0}")]
    ArchiveCreateFailure(String),

    /// Appending an entry to the temporary archive failed
    #[error("failed to write archive entry: {0}")]
    ArchiveWriteFailure(String),

    /// Finishing, syncing or renaming the archive failed
    #[error("failed to finalize archive: {0}")]
    ArchiveFinalizeFailure(String),

    /// Published archive is missing, empty or does not match its entries
    #[error("archive verification failed: {0}")]
    ArchiveVerificationFailure(String),

    /// Per-batch deadline exceeded
    #[error("batch timed out after {0}s")]
    Timeout(u64),

    /// Batch was never handed to a worker
    #[error("batch not dispatched: {0}")]
    NotDispatched(String),

    /// Worker task panicked while building the archive
    #[error("archive worker panicked: {0}")]
    WorkerPanicked(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for PackratError {
    fn from(err: std::io::Error) -> Self {
        PackratError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PackratError {
    fn from(err: serde_json::Error) -> Self {
        PackratError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PackratError {
    fn from(err: toml::de::Error) -> Self {
        PackratError::Configuration(format!("TOML parse error: {err}"))
    }
}
