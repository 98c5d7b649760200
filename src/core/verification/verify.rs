//! Archive verification
//!
//! Reopens a published archive and checks that it holds exactly the entries
//! the writer reported, reading every entry to the end so the zip reader
//! validates its CRC.

use super::checksum::calculate_file_checksum;
use crate::domain::errors::ArchiveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::Path;

/// Result of a successful archive verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveVerification {
    /// Number of entries found in the archive
    pub entry_count: usize,

    /// SHA-256 of the archive file
    pub checksum: String,
}

/// Verify a published archive against the entry names written into it
///
/// # Errors
///
/// Returns [`ArchiveError::ArchiveVerificationFailure`] if the archive cannot
/// be opened, an entry fails its CRC check, or the set of entry names differs
/// from `expected_entries`.
pub fn verify_archive(
    path: &Path,
    expected_entries: &[String],
) -> Result<ArchiveVerification, ArchiveError> {
    let fail = |message: String| ArchiveError::ArchiveVerificationFailure(message);

    let file = File::open(path)
        .map_err(|e| fail(format!("failed to open {}: {}", path.display(), e)))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| fail(format!("failed to read {}: {}", path.display(), e)))?;

    let mut found = BTreeSet::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| fail(format!("failed to open entry {i}: {e}")))?;
        let name = entry.name().to_string();
        io::copy(&mut entry, &mut io::sink())
            .map_err(|e| fail(format!("entry '{name}' is corrupt: {e}")))?;
        found.insert(name);
    }

    let expected: BTreeSet<String> = expected_entries.iter().cloned().collect();
    if found != expected {
        let missing: Vec<&String> = expected.difference(&found).collect();
        let unexpected: Vec<&String> = found.difference(&expected).collect();
        return Err(fail(format!(
            "entry mismatch (missing: {missing:?}, unexpected: {unexpected:?})"
        )));
    }

    let checksum = calculate_file_checksum(path)
        .map_err(|e| fail(format!("failed to checksum {}: {}", path.display(), e)))?;

    tracing::debug!(
        archive = %path.display(),
        entries = found.len(),
        checksum = %checksum,
        "Archive verified"
    );

    Ok(ArchiveVerification {
        entry_count: found.len(),
        checksum,
    })
}
