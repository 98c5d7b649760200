//! Export coordinator - main orchestrator for an export run
//!
//! Resolves artifacts, partitions them into batches, builds archives on a
//! bounded pool of blocking workers and reports per-record outcomes back to
//! the record store.

use super::archive::{archive_file_name, ArchiveWriter, DEFAULT_COMPRESSION_LEVEL};
use super::batch::partition;
use super::resolver::{resolve, RecordContribution, Resolution};
use super::summary::{
    ArchiveResult, ArtifactStatusIndex, ExportPlan, PipelineResult, PlannedArchive, RecordReport,
    StoreUpdateFailure,
};
use crate::adapters::store::RecordStore;
use crate::config::PackratConfig;
use crate::domain::artifact::Batch;
use crate::domain::errors::ArchiveError;
use crate::domain::ids::RecordId;
use crate::domain::record::{ExportRecord, RecordOutcome};
use crate::domain::{PackratError, Result};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Options for a single export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory archives are published to
    pub output_directory: PathBuf,

    /// Prefix of every archive name in the run
    pub run_name: String,

    /// Maximum artifacts per archive
    pub batch_size: usize,

    /// Number of archives built concurrently
    pub parallelism: usize,

    /// Stop dispatching after the first failed batch
    pub stop_on_first_failure: bool,

    /// Per-batch deadline
    pub batch_timeout: Option<Duration>,

    /// Deflate level (0-9)
    pub compression_level: i32,

    /// Reopen and checksum every published archive
    pub verify_archives: bool,
}

impl ExportOptions {
    /// Options with default batching for the given directory and run name
    pub fn new(output_directory: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self {
            output_directory: output_directory.into(),
            run_name: run_name.into(),
            batch_size: 500,
            parallelism: 4,
            stop_on_first_failure: false,
            batch_timeout: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            verify_archives: false,
        }
    }

    /// Build options from the loaded configuration
    pub fn from_config(config: &PackratConfig, run_name: impl Into<String>) -> Self {
        Self {
            output_directory: PathBuf::from(&config.export.output_directory),
            run_name: run_name.into(),
            batch_size: config.export.batch_size,
            parallelism: config.export.parallelism,
            stop_on_first_failure: config.export.stop_on_first_failure,
            batch_timeout: config.export.batch_timeout_secs.map(Duration::from_secs),
            compression_level: config.export.compression_level as i32,
            verify_archives: config.verification.enable_verification,
        }
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the worker pool size
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Stop dispatching after the first failed batch
    pub fn with_stop_on_first_failure(mut self, stop: bool) -> Self {
        self.stop_on_first_failure = stop;
        self
    }

    /// Validates the options
    ///
    /// # Errors
    ///
    /// Returns [`PackratError::Configuration`] for a zero batch size or pool
    /// size, an empty or path-like run name, or an out-of-range compression
    /// level.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PackratError::Configuration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.parallelism == 0 {
            return Err(PackratError::Configuration(
                "parallelism must be greater than 0".to_string(),
            ));
        }
        if self.run_name.trim().is_empty() {
            return Err(PackratError::Configuration(
                "run name cannot be empty".to_string(),
            ));
        }
        if self.run_name.contains(['/', '\\']) {
            return Err(PackratError::Configuration(format!(
                "run name '{}' must not contain path separators",
                self.run_name
            )));
        }
        if !(0..=9).contains(&self.compression_level) {
            return Err(PackratError::Configuration(format!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Export coordinator
pub struct ExportCoordinator {
    store: Arc<dyn RecordStore>,
    options: ExportOptions,
    shutdown: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    ///
    /// A `true` value on `shutdown` stops dispatch of further batches.
    pub fn new(
        store: Arc<dyn RecordStore>,
        options: ExportOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            options,
            shutdown,
        }
    }

    /// Options this coordinator runs with
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Work out what a run would produce without writing anything
    ///
    /// Only reads from the store; no directory is created and no record state
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`PackratError::Configuration`] if the options are invalid.
    pub async fn plan(&self, records: &[ExportRecord]) -> Result<ExportPlan> {
        self.options.validate()?;

        let resolution = resolve(self.store.as_ref(), records).await;
        let batches = partition(&resolution.artifacts, self.options.batch_size)?;

        let archives = batches
            .iter()
            .map(|batch| PlannedArchive {
                batch_index: batch.index,
                archive_name: archive_file_name(&self.options.run_name, batch.index),
                entries: batch.names().map(str::to_string).collect(),
            })
            .collect();

        let record_problems = resolution
            .contributions
            .iter()
            .filter(|(_, c)| !c.is_clean())
            .map(|(id, c)| (*id, resolution_problems(c).join("; ")))
            .collect();

        Ok(ExportPlan {
            run_name: self.options.run_name.clone(),
            total_records: records.len(),
            total_artifacts: resolution.artifacts.len(),
            archives,
            conflicts: resolution.conflicts,
            record_problems,
        })
    }

    /// Execute an export run for `records`
    ///
    /// This is the main entry point for the export process. It:
    /// 1. Validates options and prepares the output directory
    /// 2. Resolves and partitions artifacts
    /// 3. Marks every record as processing
    /// 4. Builds archives on a bounded worker pool
    /// 5. Derives and reports per-record outcomes
    ///
    /// # Errors
    ///
    /// Only configuration problems are returned as `Err`: invalid options, an
    /// unusable output directory or an archive name that already exists.
    /// Every data-path failure is captured in the returned [`PipelineResult`].
    pub async fn run(&self, records: Vec<ExportRecord>) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let records = dedup_records(records);

        self.options.validate()?;
        prepare_output_directory(&self.options.output_directory)?;

        crate::log_export_start!(self.options.run_name, records.len());

        let resolution = resolve(self.store.as_ref(), &records).await;
        let batches = partition(&resolution.artifacts, self.options.batch_size)?;
        self.check_archive_names(&batches)?;

        let mut result =
            PipelineResult::new(&self.options.run_name, &self.options.output_directory);
        result.total_artifacts = resolution.artifacts.len();

        for record in &records {
            if let Err(e) = self.store.mark_processing(record.id).await {
                tracing::warn!(
                    record_id = %record.id,
                    error = %e,
                    "Failed to mark record as processing"
                );
                result.store_failures.push(StoreUpdateFailure {
                    record_id: record.id,
                    message: e.to_string(),
                });
            }
        }

        let batch_of: HashMap<String, usize> = batches
            .iter()
            .flat_map(|b| b.names().map(move |name| (name.to_string(), b.index)))
            .collect();

        let (archives, interrupted) = self.dispatch(batches).await;
        result.archives = archives;
        result.interrupted = interrupted;
        result.finalize();

        let statuses = ArtifactStatusIndex::new(&result.archives);
        let outcomes: Vec<RecordReport> = records
            .iter()
            .map(|record| RecordReport {
                record_id: record.id,
                outcome: derive_outcome(record.id, &resolution, &batch_of, &statuses),
            })
            .collect();

        let store_failures = self.report_outcomes(&outcomes).await;
        result.store_failures.extend(store_failures);
        result.record_outcomes = outcomes;
        result.conflicts = resolution.conflicts;

        let mut result = result.with_duration(start_time.elapsed());
        result.finalize();
        result.log_summary();
        crate::log_export_complete!(result.succeeded_batches(), start_time.elapsed());

        Ok(result)
    }

    fn check_archive_names(&self, batches: &[Batch]) -> Result<()> {
        for batch in batches {
            let name = archive_file_name(&self.options.run_name, batch.index);
            let path = self.options.output_directory.join(&name);
            if path.exists() {
                return Err(PackratError::Configuration(format!(
                    "Archive {} already exists; choose a different run name",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// Run batches through the worker pool
    ///
    /// Returns the batch results in completion order and whether a shutdown
    /// request kept any batch from being dispatched.
    async fn dispatch(&self, batches: Vec<Batch>) -> (Vec<ArchiveResult>, bool) {
        let total = batches.len();
        if total == 0 {
            return (Vec::new(), false);
        }

        tracing::info!(
            batches = total,
            parallelism = self.options.parallelism,
            output_directory = %self.options.output_directory.display(),
            "Dispatching batches"
        );

        let writer = Arc::new(
            ArchiveWriter::new(self.options.compression_level)
                .with_timeout(self.options.batch_timeout)
                .with_verification(self.options.verify_archives),
        );
        let output_dir = Arc::new(self.options.output_directory.clone());
        let halted = Arc::new(AtomicBool::new(false));
        let interrupted = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicUsize::new(0));
        let stop_on_first_failure = self.options.stop_on_first_failure;

        let results: Vec<ArchiveResult> = stream::iter(batches)
            .map(|batch| {
                let writer = Arc::clone(&writer);
                let output_dir = Arc::clone(&output_dir);
                let halted = Arc::clone(&halted);
                let interrupted = Arc::clone(&interrupted);
                let completed = Arc::clone(&completed);
                let shutdown_requested = *self.shutdown.borrow();
                let archive_name = archive_file_name(&self.options.run_name, batch.index);

                async move {
                    if shutdown_requested {
                        interrupted.store(true, Ordering::SeqCst);
                        tracing::warn!(
                            batch_index = batch.index,
                            "Shutdown requested, batch not dispatched"
                        );
                        return ArchiveResult::not_dispatched(
                            &batch,
                            archive_name,
                            "shutdown requested",
                        );
                    }
                    if halted.load(Ordering::SeqCst) {
                        tracing::warn!(
                            batch_index = batch.index,
                            "Earlier batch failed, batch not dispatched"
                        );
                        return ArchiveResult::not_dispatched(
                            &batch,
                            archive_name,
                            "stopped after an earlier batch failed",
                        );
                    }

                    let batch_index = batch.index;
                    let name = archive_name.clone();
                    let result = match tokio::task::spawn_blocking(move || {
                        writer.write(&batch, &output_dir, &archive_name)
                    })
                    .await
                    {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(
                                batch_index,
                                error = %e,
                                "Archive worker failed"
                            );
                            ArchiveResult::failed(
                                batch_index,
                                name,
                                ArchiveError::WorkerPanicked(e.to_string()),
                            )
                        }
                    };

                    if !result.success && stop_on_first_failure {
                        halted.store(true, Ordering::SeqCst);
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    crate::log_batch_processing!(done, total);

                    result
                }
            })
            .buffer_unordered(self.options.parallelism)
            .collect()
            .await;

        (results, interrupted.load(Ordering::SeqCst))
    }

    /// Report outcomes to the store, returning the updates that failed
    async fn report_outcomes(&self, outcomes: &[RecordReport]) -> Vec<StoreUpdateFailure> {
        let mut failures = Vec::new();

        for report in outcomes {
            let update = match &report.outcome {
                RecordOutcome::Processed => self.store.mark_processed(report.record_id).await,
                RecordOutcome::Errored { message } => {
                    self.store.mark_errored(report.record_id, message).await
                }
            };

            if let Err(e) = update {
                tracing::warn!(
                    record_id = %report.record_id,
                    outcome = %report.outcome.state(),
                    error = %e,
                    "Failed to report record outcome"
                );
                failures.push(StoreUpdateFailure {
                    record_id: report.record_id,
                    message: e.to_string(),
                });
            }
        }

        failures
    }
}

/// Run a complete export for `records`
///
/// Convenience wrapper around [`ExportCoordinator::run`].
///
/// # Errors
///
/// See [`ExportCoordinator::run`].
///
/// # Example
///
/// ```rust,no_run
/// use packrat::adapters::store::InMemoryRecordStore;
/// use packrat::core::export::{run_export, ExportOptions};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(InMemoryRecordStore::new());
/// let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
///
/// let options = ExportOptions::new("/srv/exports", "run").with_batch_size(10);
/// let result = run_export(store, Vec::new(), options, shutdown_rx).await?;
/// assert!(result.success);
/// # Ok(())
/// # }
/// ```
pub async fn run_export(
    store: Arc<dyn RecordStore>,
    records: Vec<ExportRecord>,
    options: ExportOptions,
    shutdown: watch::Receiver<bool>,
) -> Result<PipelineResult> {
    ExportCoordinator::new(store, options, shutdown)
        .run(records)
        .await
}

/// Create the output directory if needed and make sure it accepts new files
fn prepare_output_directory(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        PackratError::Configuration(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    tempfile::Builder::new()
        .prefix(".packrat-probe.")
        .tempfile_in(dir)
        .map_err(|e| {
            PackratError::Configuration(format!(
                "Output directory {} is not writable: {}",
                dir.display(),
                e
            ))
        })?;

    Ok(())
}

/// Drop repeated record IDs, keeping the first occurrence
fn dedup_records(records: Vec<ExportRecord>) -> Vec<ExportRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let first = seen.insert(r.id);
            if !first {
                tracing::warn!(record_id = %r.id, "Ignoring duplicate record in input");
            }
            first
        })
        .collect()
}

fn resolution_problems(contribution: &RecordContribution) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(error) = &contribution.fetch_error {
        problems.push(format!("artifact lookup failed: {error}"));
    }
    problems.extend(
        contribution
            .problems
            .iter()
            .map(|p| format!("malformed reference: {p}")),
    );
    problems
}

/// Work out whether every artifact a record depends on was captured
fn derive_outcome(
    record_id: RecordId,
    resolution: &Resolution,
    batch_of: &HashMap<String, usize>,
    statuses: &ArtifactStatusIndex<'_>,
) -> RecordOutcome {
    let Some(contribution) = resolution.contributions.get(&record_id) else {
        return RecordOutcome::Processed;
    };

    let mut problems = resolution_problems(contribution);

    for name in &contribution.artifact_names {
        let reason = match batch_of.get(name) {
            Some(&index) => statuses.failure_reason(name, index),
            None => Some("not assigned to any batch".to_string()),
        };
        if let Some(reason) = reason {
            problems.push(format!("{name}: {reason}"));
        }
    }

    if problems.is_empty() {
        RecordOutcome::Processed
    } else {
        RecordOutcome::Errored {
            message: problems.join("; "),
        }
    }
}
