//! Archive writer
//!
//! Builds one zip archive per batch. The archive is staged in a temporary
//! sibling of the final path, finished and synced, and only then renamed into
//! place. The final path therefore either does not exist or holds a complete
//! archive; a staged archive that is dropped before publishing leaves nothing
//! behind.
//!
//! All work here is blocking file I/O. The coordinator runs writers on the
//! blocking thread pool.

use super::summary::{ArchiveResult, SkippedArtifact};
use crate::core::verification::verify_archive;
use crate::domain::artifact::{Batch, BatchEntry};
use crate::domain::errors::{ArchiveError, SkipReason};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Extension of published archives
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Suffix of staged, unpublished archives
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Default deflate level; favours speed over size
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// Archive file name for a batch: `<run_name>_<index>.zip`
///
/// # Examples
///
/// ```
/// use packrat::core::export::archive::archive_file_name;
///
/// assert_eq!(archive_file_name("run", 1), "run_1.zip");
/// ```
pub fn archive_file_name(run_name: &str, batch_index: usize) -> String {
    format!("{run_name}_{batch_index}.{ARCHIVE_EXTENSION}")
}

/// Writes batches into published zip archives
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    compression_level: i32,
    timeout: Option<Duration>,
    verify: bool,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ArchiveWriter {
    /// Create a writer using the given deflate level (0-9)
    pub fn new(compression_level: i32) -> Self {
        Self {
            compression_level,
            timeout: None,
            verify: false,
        }
    }

    /// Bound the time a single batch may take
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reopen and check every published archive
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Build, publish and optionally verify the archive for one batch
    ///
    /// Never returns an error: every failure is recorded in the returned
    /// [`ArchiveResult`].
    pub fn write(&self, batch: &Batch, output_dir: &Path, archive_name: &str) -> ArchiveResult {
        let started = Instant::now();
        let mut result = ArchiveResult::new(batch.index, archive_name);

        tracing::debug!(
            batch_index = batch.index,
            archive = archive_name,
            entries = batch.len(),
            "Building archive"
        );

        match self.build(batch, output_dir, &mut result) {
            Ok(path) => {
                tracing::info!(
                    batch_index = batch.index,
                    archive = %path.display(),
                    entries = result.entries.len(),
                    skipped = result.skipped.len(),
                    "Published archive"
                );
                result.publish(path);
            }
            Err(error) => {
                tracing::error!(
                    batch_index = batch.index,
                    archive = archive_name,
                    error = %error,
                    "Failed to build archive"
                );
                result.fail(error);
            }
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }

    fn build(
        &self,
        batch: &Batch,
        output_dir: &Path,
        result: &mut ArchiveResult,
    ) -> Result<PathBuf, ArchiveError> {
        let staged = self.stage(batch, output_dir, result)?;
        let path = staged.publish()?;

        if self.verify {
            match verify_archive(&path, &result.entries) {
                Ok(verification) => result.checksum = Some(verification.checksum),
                Err(error) => {
                    // A published archive that fails verification is not kept
                    if let Err(e) = fs::remove_file(&path) {
                        tracing::warn!(
                            archive = %path.display(),
                            error = %e,
                            "Failed to remove archive that failed verification"
                        );
                    }
                    return Err(error);
                }
            }
        }

        Ok(path)
    }

    /// Write a batch into a temporary archive without publishing it
    ///
    /// Captured entry names and skipped artifacts are recorded in `result` as
    /// they are processed. Dropping the returned [`StagedArchive`] removes the
    /// temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::ArchiveCreateFailure`] if the final path is
    /// already taken or the temporary file cannot be created,
    /// [`ArchiveError::ArchiveWriteFailure`] if an entry cannot be appended,
    /// [`ArchiveError::ArchiveFinalizeFailure`] if the archive cannot be
    /// finished or synced and [`ArchiveError::Timeout`] if the batch runs out
    /// of time.
    pub fn stage(
        &self,
        batch: &Batch,
        output_dir: &Path,
        result: &mut ArchiveResult,
    ) -> Result<StagedArchive, ArchiveError> {
        let deadline = self.timeout.map(|timeout| Deadline {
            at: Instant::now() + timeout,
            timeout,
        });
        let final_path = output_dir.join(&result.archive_name);

        if final_path.exists() {
            return Err(ArchiveError::ArchiveCreateFailure(format!(
                "{} already exists",
                final_path.display()
            )));
        }

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", result.archive_name))
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(output_dir)
            .map_err(|e| {
                ArchiveError::ArchiveCreateFailure(format!(
                    "failed to create temporary archive in {}: {}",
                    output_dir.display(),
                    e
                ))
            })?;

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level));
        let mut zip = ZipWriter::new(temp);

        for entry in &batch.entries {
            check_deadline(deadline)?;

            let data = match read_artifact(entry) {
                Ok(data) => data,
                Err(reason) => {
                    tracing::warn!(
                        batch_index = batch.index,
                        artifact = %entry.name,
                        reason = %reason,
                        "Skipping artifact"
                    );
                    result.skipped.push(SkippedArtifact {
                        name: entry.name.clone(),
                        reason,
                    });
                    continue;
                }
            };

            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| {
                    ArchiveError::ArchiveWriteFailure(format!("{}: {}", entry.name, e))
                })?;
            zip.write_all(&data).map_err(|e| {
                ArchiveError::ArchiveWriteFailure(format!("{}: {}", entry.name, e))
            })?;

            tracing::debug!(
                batch_index = batch.index,
                artifact = %entry.name,
                bytes = data.len(),
                "Added artifact to archive"
            );
            result.entries.push(entry.name.clone());
        }

        if result.entries.is_empty() {
            tracing::warn!(
                batch_index = batch.index,
                skipped = result.skipped.len(),
                "Every artifact in batch was skipped, publishing empty archive"
            );
        }

        check_deadline(deadline)?;

        let temp = zip
            .finish()
            .map_err(|e| ArchiveError::ArchiveFinalizeFailure(e.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ArchiveError::ArchiveFinalizeFailure(format!("fsync failed: {e}")))?;

        Ok(StagedArchive {
            temp,
            final_path,
            deadline,
        })
    }
}

/// A finished archive waiting in its temporary file
#[derive(Debug)]
pub struct StagedArchive {
    temp: NamedTempFile,
    final_path: PathBuf,
    deadline: Option<Deadline>,
}

impl StagedArchive {
    /// Path of the temporary file
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Path the archive is published to
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Rename the archive into place and check the result
    ///
    /// The rename refuses to replace an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Timeout`] if the batch deadline has passed,
    /// [`ArchiveError::ArchiveFinalizeFailure`] if the rename fails and
    /// [`ArchiveError::ArchiveVerificationFailure`] if the published file is
    /// missing or empty.
    pub fn publish(self) -> Result<PathBuf, ArchiveError> {
        check_deadline(self.deadline)?;

        let StagedArchive {
            temp, final_path, ..
        } = self;

        temp.persist_noclobber(&final_path).map_err(|e| {
            ArchiveError::ArchiveFinalizeFailure(format!(
                "failed to publish {}: {}",
                final_path.display(),
                e.error
            ))
        })?;
        sync_parent_dir(&final_path);

        match fs::metadata(&final_path) {
            Ok(metadata) if metadata.len() > 0 => Ok(final_path),
            Ok(_) => {
                if let Err(e) = fs::remove_file(&final_path) {
                    tracing::warn!(
                        archive = %final_path.display(),
                        error = %e,
                        "Failed to remove empty published archive"
                    );
                }
                Err(ArchiveError::ArchiveVerificationFailure(format!(
                    "{} is empty after publishing",
                    final_path.display()
                )))
            }
            Err(e) => Err(ArchiveError::ArchiveVerificationFailure(format!(
                "{} is missing after publishing: {}",
                final_path.display(),
                e
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

fn check_deadline(deadline: Option<Deadline>) -> Result<(), ArchiveError> {
    match deadline {
        Some(d) if Instant::now() >= d.at => Err(ArchiveError::Timeout(d.timeout.as_secs())),
        _ => Ok(()),
    }
}

/// Read an artifact fully, classifying anything unusable as a skip
fn read_artifact(entry: &BatchEntry) -> Result<Vec<u8>, SkipReason> {
    let path = entry.source_path();
    let display = path.display().to_string();

    let classify = |e: io::Error| match e.kind() {
        io::ErrorKind::NotFound => SkipReason::ArtifactMissing {
            path: display.clone(),
        },
        _ => SkipReason::ArtifactReadFailure {
            path: display.clone(),
            message: e.to_string(),
        },
    };

    let metadata = fs::metadata(&path).map_err(&classify)?;
    if !metadata.is_file() || metadata.len() == 0 {
        return Err(SkipReason::ArtifactEmpty {
            path: display.clone(),
        });
    }

    let data = fs::read(&path).map_err(&classify)?;
    if data.is_empty() {
        return Err(SkipReason::ArtifactEmpty { path: display });
    }

    Ok(data)
}

/// Best-effort fsync of the directory holding `path` so the rename is durable
fn sync_parent_dir(path: &Path) {
    let Some(dir) = path.parent() else {
        return;
    };
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %e, "Directory sync skipped");
    }
}
