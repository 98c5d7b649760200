//! Export results and reporting
//!
//! Structured results for a single archive and for a whole run. Everything
//! that can go wrong while building archives is captured here rather than
//! returned as an error.

use crate::domain::artifact::{ArtifactConflict, Batch};
use crate::domain::errors::{ArchiveError, SkipReason};
use crate::domain::ids::RecordId;
use crate::domain::record::RecordOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// An artifact left out of its archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedArtifact {
    /// Artifact base name
    pub name: String,

    /// Why it was skipped
    pub reason: SkipReason,
}

/// Result of building one archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveResult {
    /// Index of the batch this archive was built from
    pub batch_index: usize,

    /// Archive file name, e.g. `run_1.zip`
    pub archive_name: String,

    /// Final path, set only once the archive is published and verified
    pub archive_path: Option<PathBuf>,

    /// Entry names written into the archive
    pub entries: Vec<String>,

    /// Artifacts that were skipped
    pub skipped: Vec<SkippedArtifact>,

    /// Batch-level failure, if any
    pub error: Option<ArchiveError>,

    /// SHA-256 of the published archive when verification is enabled
    pub checksum: Option<String>,

    /// Overall batch success flag
    pub success: bool,

    /// Wall time spent on the batch
    pub duration_ms: u64,
}

impl ArchiveResult {
    /// Creates an empty, not-yet-successful result
    pub fn new(batch_index: usize, archive_name: impl Into<String>) -> Self {
        Self {
            batch_index,
            archive_name: archive_name.into(),
            archive_path: None,
            entries: Vec::new(),
            skipped: Vec::new(),
            error: None,
            checksum: None,
            success: false,
            duration_ms: 0,
        }
    }

    /// Creates a failed result
    pub fn failed(
        batch_index: usize,
        archive_name: impl Into<String>,
        error: ArchiveError,
    ) -> Self {
        let mut result = Self::new(batch_index, archive_name);
        result.error = Some(error);
        result
    }

    /// Creates a result for a batch that was never handed to a worker
    pub fn not_dispatched(batch: &Batch, archive_name: impl Into<String>, reason: &str) -> Self {
        Self::failed(
            batch.index,
            archive_name,
            ArchiveError::NotDispatched(reason.to_string()),
        )
    }

    /// Marks the result as published at `path`
    pub fn publish(&mut self, path: PathBuf) {
        self.archive_path = Some(path);
        self.error = None;
        self.success = true;
    }

    /// Marks the result as failed and forgets any published path
    pub fn fail(&mut self, error: ArchiveError) {
        self.archive_path = None;
        self.error = Some(error);
        self.success = false;
    }

    /// Returns true if `name` is inside a successfully published archive
    pub fn captured(&self, name: &str) -> bool {
        self.success && self.entries.iter().any(|e| e == name)
    }

    /// Skip reason recorded for `name`, if any
    pub fn skip_reason(&self, name: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.reason)
    }

    /// Explains why `name` did not make it into a published archive
    ///
    /// Returns `None` if the artifact was captured.
    pub fn failure_reason(&self, name: &str) -> Option<String> {
        if self.captured(name) {
            return None;
        }
        if let Some(reason) = self.skip_reason(name) {
            return Some(reason.to_string());
        }
        match &self.error {
            Some(error) => Some(format!("batch {} failed: {}", self.batch_index, error)),
            None => Some(format!("not captured in {}", self.archive_name)),
        }
    }
}

/// Artifact lookups across every archive of a run
///
/// Built once after dispatch so deriving record outcomes costs one hash
/// lookup per artifact. Artifact names are unique within a run, so one set
/// covers all archives.
#[derive(Debug)]
pub struct ArtifactStatusIndex<'a> {
    captured: HashSet<&'a str>,
    skipped: HashMap<&'a str, &'a SkipReason>,
    archives: HashMap<usize, &'a ArchiveResult>,
}

impl<'a> ArtifactStatusIndex<'a> {
    /// Index the entries and skips of `archives`
    pub fn new(archives: &'a [ArchiveResult]) -> Self {
        let mut captured = HashSet::new();
        let mut skipped = HashMap::new();
        let mut by_index = HashMap::with_capacity(archives.len());

        for archive in archives {
            if archive.success {
                captured.extend(archive.entries.iter().map(String::as_str));
            }
            for skip in &archive.skipped {
                skipped.insert(skip.name.as_str(), &skip.reason);
            }
            by_index.insert(archive.batch_index, archive);
        }

        Self {
            captured,
            skipped,
            archives: by_index,
        }
    }

    /// Explains why `name`, assigned to batch `batch_index`, did not make it
    /// into a published archive
    ///
    /// Returns `None` if the artifact was captured. Matches
    /// [`ArchiveResult::failure_reason`].
    pub fn failure_reason(&self, name: &str, batch_index: usize) -> Option<String> {
        if self.captured.contains(name) {
            return None;
        }
        if let Some(reason) = self.skipped.get(name) {
            return Some(reason.to_string());
        }
        match self.archives.get(&batch_index) {
            Some(archive) => match &archive.error {
                Some(error) => Some(format!("batch {} failed: {}", archive.batch_index, error)),
                None => Some(format!("not captured in {}", archive.archive_name)),
            },
            None => Some("not assigned to any batch".to_string()),
        }
    }
}

/// Final outcome reported for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    /// Record the outcome belongs to
    pub record_id: RecordId,

    /// Processed, or errored with an aggregated message
    pub outcome: RecordOutcome,
}

/// A state update the store refused or could not write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreUpdateFailure {
    /// Record being updated
    pub record_id: RecordId,

    /// Store error message
    pub message: String,
}

/// Result of a complete export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Run name used as the archive prefix
    pub run_name: String,

    /// Directory archives were published to
    pub output_directory: PathBuf,

    /// Overall success flag
    pub success: bool,

    /// One result per batch, ordered by batch index
    pub archives: Vec<ArchiveResult>,

    /// One outcome per input record, in input order
    pub record_outcomes: Vec<RecordReport>,

    /// Artifact names dropped in favour of an earlier source directory
    pub conflicts: Vec<ArtifactConflict>,

    /// Record state updates that failed after the run
    pub store_failures: Vec<StoreUpdateFailure>,

    /// Unique artifacts resolved for the run
    pub total_artifacts: usize,

    /// Set when a shutdown request stopped dispatch early
    pub interrupted: bool,

    /// Wall time of the run
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Creates an empty result for a run
    pub fn new(run_name: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            run_name: run_name.into(),
            output_directory: output_directory.into(),
            success: true,
            archives: Vec::new(),
            record_outcomes: Vec::new(),
            conflicts: Vec::new(),
            store_failures: Vec::new(),
            total_artifacts: 0,
            interrupted: false,
            duration_ms: 0,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Recomputes the overall success flag
    ///
    /// A run succeeds when every batch succeeded, every record state update
    /// was accepted and the run was not interrupted.
    pub fn finalize(&mut self) {
        self.archives.sort_by_key(|a| a.batch_index);
        self.success = self.archives.iter().all(|a| a.success)
            && self.store_failures.is_empty()
            && !self.interrupted;
    }

    /// Total number of batches
    pub fn total_batches(&self) -> usize {
        self.archives.len()
    }

    /// Number of published archives
    pub fn succeeded_batches(&self) -> usize {
        self.archives.iter().filter(|a| a.success).count()
    }

    /// Number of failed or undispatched batches
    pub fn failed_batches(&self) -> usize {
        self.total_batches() - self.succeeded_batches()
    }

    /// Number of records reported as processed
    pub fn processed_records(&self) -> usize {
        self.record_outcomes
            .iter()
            .filter(|r| r.outcome.is_processed())
            .count()
    }

    /// Number of records reported as errored
    pub fn errored_records(&self) -> usize {
        self.record_outcomes.len() - self.processed_records()
    }

    /// Number of artifacts skipped across all archives
    pub fn skipped_artifacts(&self) -> usize {
        self.archives.iter().map(|a| a.skipped.len()).sum()
    }

    /// Paths of every published archive
    pub fn archive_paths(&self) -> Vec<&PathBuf> {
        self.archives
            .iter()
            .filter_map(|a| a.archive_path.as_ref())
            .collect()
    }

    /// Outcome reported for a record
    pub fn outcome_for(&self, record_id: RecordId) -> Option<&RecordOutcome> {
        self.record_outcomes
            .iter()
            .find(|r| r.record_id == record_id)
            .map(|r| &r.outcome)
    }

    /// Get batch success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.archives.is_empty() {
            return 100.0;
        }
        (self.succeeded_batches() as f64 / self.total_batches() as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_name = %self.run_name,
            artifacts = self.total_artifacts,
            batches = self.total_batches(),
            succeeded = self.succeeded_batches(),
            failed = self.failed_batches(),
            skipped_artifacts = self.skipped_artifacts(),
            processed_records = self.processed_records(),
            errored_records = self.errored_records(),
            duration_ms = self.duration_ms,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        for archive in self.archives.iter().filter(|a| !a.success) {
            if let Some(error) = &archive.error {
                tracing::warn!(
                    batch_index = archive.batch_index,
                    archive = %archive.archive_name,
                    error = %error,
                    "Batch failed"
                );
            }
        }

        if !self.store_failures.is_empty() {
            tracing::warn!(
                failures = self.store_failures.len(),
                "Some record state updates failed"
            );
            for failure in &self.store_failures {
                tracing::warn!(
                    record_id = %failure.record_id,
                    message = %failure.message,
                    "Record state update failed"
                );
            }
        }

        if self.interrupted {
            tracing::warn!("Export was interrupted before all batches were dispatched");
        }
    }
}

/// One archive planned by a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedArchive {
    /// Batch index
    pub batch_index: usize,

    /// Archive file name
    pub archive_name: String,

    /// Entry names in archive order
    pub entries: Vec<String>,
}

/// What a run would do, computed without touching the filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPlan {
    /// Run name used as the archive prefix
    pub run_name: String,

    /// Number of input records
    pub total_records: usize,

    /// Unique artifacts resolved
    pub total_artifacts: usize,

    /// Archives that would be written
    pub archives: Vec<PlannedArchive>,

    /// Dropped duplicate references
    pub conflicts: Vec<ArtifactConflict>,

    /// Records that would be reported as errored before any archive is
    /// written, with the reason
    pub record_problems: Vec<(RecordId, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(index: usize, entries: &[&str]) -> ArchiveResult {
        let mut result = ArchiveResult::new(index, format!("run_{index}.zip"));
        result.entries = entries.iter().map(|s| s.to_string()).collect();
        result.publish(PathBuf::from(format!("/out/run_{index}.zip")));
        result
    }

    #[test]
    fn test_archive_result_captured() {
        let result = published(1, &["A.bin", "B.bin"]);
        assert!(result.captured("A.bin"));
        assert!(!result.captured("C.bin"));
        assert_eq!(result.failure_reason("A.bin"), None);
    }

    #[test]
    fn test_failure_reason_prefers_skip_reason() {
        let mut result = published(1, &["A.bin"]);
        result.skipped.push(SkippedArtifact {
            name: "B.bin".to_string(),
            reason: SkipReason::ArtifactMissing {
                path: "/d/B.bin".to_string(),
            },
        });

        assert_eq!(
            result.failure_reason("B.bin").as_deref(),
            Some("artifact missing at /d/B.bin")
        );
    }

    #[test]
    fn test_failed_batch_captures_nothing() {
        let mut result = published(2, &["A.bin"]);
        result.fail(ArchiveError::ArchiveFinalizeFailure("disk full".to_string()));

        assert!(!result.success);
        assert!(result.archive_path.is_none());
        assert!(!result.captured("A.bin"));
        let reason = result.failure_reason("A.bin").unwrap();
        assert!(reason.starts_with("batch 2 failed"));
    }

    #[test]
    fn test_status_index_matches_archive_results() {
        let mut first = published(1, &["A.bin"]);
        first.skipped.push(SkippedArtifact {
            name: "B.bin".to_string(),
            reason: SkipReason::ArtifactMissing {
                path: "/d/B.bin".to_string(),
            },
        });
        let mut second = published(2, &["C.bin"]);
        second.fail(ArchiveError::Timeout(5));
        let archives = vec![first, second];

        let index = ArtifactStatusIndex::new(&archives);

        for (name, batch) in [("A.bin", 1), ("B.bin", 1), ("C.bin", 2)] {
            assert_eq!(
                index.failure_reason(name, batch),
                archives[batch - 1].failure_reason(name)
            );
        }
        assert_eq!(index.failure_reason("A.bin", 1), None);
        assert_eq!(
            index.failure_reason("C.bin", 2).as_deref(),
            Some("batch 2 failed: batch timed out after 5s")
        );
        assert_eq!(
            index.failure_reason("D.bin", 3).as_deref(),
            Some("not assigned to any batch")
        );
    }

    #[test]
    fn test_pipeline_result_success_rules() {
        let mut result = PipelineResult::new("run", "/out");
        result.archives.push(published(2, &["C"]));
        result.archives.push(published(1, &["A"]));
        result.finalize();

        assert!(result.success);
        assert_eq!(result.archives[0].batch_index, 1);
        assert_eq!(result.success_rate(), 100.0);

        result.store_failures.push(StoreUpdateFailure {
            record_id: RecordId::new(1),
            message: "rejected".to_string(),
        });
        result.finalize();
        assert!(!result.success);
    }

    #[test]
    fn test_pipeline_result_interrupted_is_not_success() {
        let mut result = PipelineResult::new("run", "/out");
        result.interrupted = true;
        result.finalize();
        assert!(!result.success);
    }

    #[test]
    fn test_pipeline_result_counts() {
        let mut result = PipelineResult::new("run", "/out");
        result.archives.push(published(1, &["A"]));
        result
            .archives
            .push(ArchiveResult::failed(2, "run_2.zip", ArchiveError::Timeout(30)));
        result.record_outcomes.push(RecordReport {
            record_id: RecordId::new(1),
            outcome: RecordOutcome::Processed,
        });
        result.record_outcomes.push(RecordReport {
            record_id: RecordId::new(2),
            outcome: RecordOutcome::Errored {
                message: "B: batch 2 failed".to_string(),
            },
        });
        result.finalize();

        assert_eq!(result.total_batches(), 2);
        assert_eq!(result.succeeded_batches(), 1);
        assert_eq!(result.failed_batches(), 1);
        assert_eq!(result.processed_records(), 1);
        assert_eq!(result.errored_records(), 1);
        assert_eq!(result.archive_paths().len(), 1);
        assert_eq!(result.success_rate(), 50.0);
        assert!(result.outcome_for(RecordId::new(2)).is_some());
    }

    #[test]
    fn test_pipeline_result_serializes() {
        let mut result = PipelineResult::new("run", "/out");
        result
            .archives
            .push(ArchiveResult::failed(1, "run_1.zip", ArchiveError::Timeout(30)));
        result.finalize();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["archives"][0]["error"]["kind"], "timeout");
    }
}
