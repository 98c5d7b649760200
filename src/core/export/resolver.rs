//! Artifact resolution
//!
//! Turns a list of records into a deduplicated [`ArtifactMap`]. Resolution
//! only talks to the record store; existence and size checks are left to the
//! archive writer so a file is inspected exactly once, right before it is
//! read.

use crate::adapters::store::RecordStore;
use crate::domain::artifact::{ArtifactConflict, ArtifactMap, ArtifactRef};
use crate::domain::ids::RecordId;
use crate::domain::record::ExportRecord;
use indexmap::IndexMap;
use serde::Serialize;

/// What one record contributes to the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordContribution {
    /// Artifact names the record depends on, in first-seen order
    pub artifact_names: Vec<String>,

    /// Malformed references, one message each
    pub problems: Vec<String>,

    /// Set when the record's references could not be fetched
    pub fetch_error: Option<String>,
}

impl RecordContribution {
    /// Returns true when nothing went wrong during resolution
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty() && self.fetch_error.is_none()
    }
}

/// Output of artifact resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Unique artifact name to source directory
    pub artifacts: ArtifactMap,

    /// Per-record contributions, keyed in input order
    pub contributions: IndexMap<RecordId, RecordContribution>,

    /// Names referenced again from a different directory
    pub conflicts: Vec<ArtifactConflict>,
}

impl Resolution {
    /// Creates an empty resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the artifact references of one record
    ///
    /// Malformed references are recorded as problems on the record and
    /// skipped. A name that is already in the map keeps its first source
    /// directory; a differing directory is recorded as a conflict.
    pub fn add_record_refs<S: AsRef<str>>(&mut self, record_id: RecordId, refs: &[S]) {
        let contribution = self.contributions.entry(record_id).or_default();

        for raw in refs {
            let raw = raw.as_ref();
            let artifact = match ArtifactRef::parse(raw) {
                Ok(artifact) => artifact,
                Err(problem) => {
                    tracing::warn!(
                        record_id = %record_id,
                        reference = raw,
                        reason = %problem,
                        "Skipping malformed artifact reference"
                    );
                    contribution.problems.push(problem);
                    continue;
                }
            };

            if !contribution.artifact_names.contains(&artifact.name) {
                contribution.artifact_names.push(artifact.name.clone());
            }

            let name = artifact.name.clone();
            let dropped_dir = artifact.source_dir.clone();
            if let Some(kept_dir) = self.artifacts.insert_first(artifact) {
                if kept_dir != dropped_dir {
                    tracing::warn!(
                        record_id = %record_id,
                        artifact = %name,
                        kept = %kept_dir.display(),
                        dropped = %dropped_dir.display(),
                        "Artifact name already resolved from another directory"
                    );
                    self.conflicts.push(ArtifactConflict {
                        name,
                        kept_dir: kept_dir.to_path_buf(),
                        dropped_dir,
                        record_id,
                    });
                }
            }
        }
    }

    /// Records that a record's references could not be fetched
    pub fn add_fetch_failure(&mut self, record_id: RecordId, message: impl Into<String>) {
        let contribution = self.contributions.entry(record_id).or_default();
        contribution.fetch_error = Some(message.into());
    }

    /// Number of records whose references could not be fetched
    pub fn fetch_failures(&self) -> usize {
        self.contributions
            .values()
            .filter(|c| c.fetch_error.is_some())
            .count()
    }
}

/// Resolve the artifacts of `records` through the store
///
/// Records are processed sequentially. A failed lookup is logged and the
/// record is skipped; it never aborts resolution.
pub async fn resolve(store: &dyn RecordStore, records: &[ExportRecord]) -> Resolution {
    let mut resolution = Resolution::new();

    for record in records {
        match store.fetch_artifact_refs(record.id).await {
            Ok(refs) => {
                tracing::debug!(
                    record_id = %record.id,
                    references = refs.len(),
                    "Fetched artifact references"
                );
                resolution.add_record_refs(record.id, &refs);
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id,
                    error = %e,
                    "Failed to fetch artifact references, skipping record"
                );
                resolution.add_fetch_failure(record.id, e.to_string());
            }
        }
    }

    tracing::info!(
        records = records.len(),
        artifacts = resolution.artifacts.len(),
        conflicts = resolution.conflicts.len(),
        fetch_failures = resolution.fetch_failures(),
        "Resolved artifacts"
    );

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{InMemoryRecordStore, StoredRecord};
    use crate::domain::ids::AccountId;
    use std::path::Path;

    fn record(id: i64) -> ExportRecord {
        ExportRecord::new(RecordId::new(id), "invoice", AccountId::new("acct-1").unwrap())
    }

    fn stored(id: i64, refs: &[&str]) -> StoredRecord {
        StoredRecord::new(record(id), refs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_duplicates_collapse_first_wins() {
        let mut resolution = Resolution::new();
        resolution.add_record_refs(RecordId::new(1), &["/first/A.bin", "/first/B.bin"]);
        resolution.add_record_refs(RecordId::new(2), &["/second/A.bin"]);

        assert_eq!(resolution.artifacts.len(), 2);
        assert_eq!(resolution.artifacts.get("A.bin"), Some(Path::new("/first")));
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(resolution.conflicts[0].record_id, RecordId::new(2));
        assert_eq!(resolution.conflicts[0].dropped_dir, Path::new("/second"));

        // Record 2 still depends on A.bin
        let second = &resolution.contributions[&RecordId::new(2)];
        assert_eq!(second.artifact_names, vec!["A.bin".to_string()]);
    }

    #[test]
    fn test_same_directory_duplicate_is_not_a_conflict() {
        let mut resolution = Resolution::new();
        resolution.add_record_refs(RecordId::new(1), &["/d/A.bin"]);
        resolution.add_record_refs(RecordId::new(2), &["/d/A.bin"]);

        assert_eq!(resolution.artifacts.len(), 1);
        assert!(resolution.conflicts.is_empty());
    }

    #[test]
    fn test_repeated_reference_within_record_counted_once() {
        let mut resolution = Resolution::new();
        resolution.add_record_refs(RecordId::new(1), &["/d/A.bin", "/d/A.bin"]);

        let contribution = &resolution.contributions[&RecordId::new(1)];
        assert_eq!(contribution.artifact_names, vec!["A.bin".to_string()]);
    }

    #[test]
    fn test_malformed_references_are_skipped() {
        let mut resolution = Resolution::new();
        resolution.add_record_refs(RecordId::new(1), &["", "no_separator.bin", "/d/ok.bin"]);

        assert_eq!(resolution.artifacts.len(), 1);
        let contribution = &resolution.contributions[&RecordId::new(1)];
        assert_eq!(contribution.problems.len(), 2);
        assert!(!contribution.is_clean());
    }

    #[tokio::test]
    async fn test_resolve_skips_failed_fetch() {
        let store = InMemoryRecordStore::with_records([
            stored(1, &["/d/A.bin"]),
            stored(2, &["/d/B.bin"]),
        ]);
        store.fail_fetch_for(RecordId::new(1)).await;

        let resolution = resolve(&store, &[record(1), record(2)]).await;

        assert_eq!(resolution.artifacts.len(), 1);
        assert!(resolution.artifacts.contains("B.bin"));
        assert_eq!(resolution.fetch_failures(), 1);
        assert!(resolution.contributions[&RecordId::new(1)]
            .fetch_error
            .is_some());
    }

    #[tokio::test]
    async fn test_resolve_no_records() {
        let store = InMemoryRecordStore::new();
        let resolution = resolve(&store, &[]).await;
        assert!(resolution.artifacts.is_empty());
        assert!(resolution.contributions.is_empty());
    }
}
