//! Artifact, artifact map and batch models
//!
//! An artifact is identified by its base name. The [`ArtifactMap`] holds one
//! source directory per name and is frozen before any archive is written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ids::RecordId;

/// A single artifact reference split into base name and source directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Base name, used as the archive entry name
    pub name: String,

    /// Directory the artifact is read from
    pub source_dir: PathBuf,
}

impl ArtifactRef {
    /// Splits a path-like string at its last `/` or `\` separator
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for empty paths, paths without a
    /// separator and paths with an empty base name.
    ///
    /// # Examples
    ///
    /// ```
    /// use packrat::domain::artifact::ArtifactRef;
    /// use std::path::Path;
    ///
    /// let artifact = ArtifactRef::parse("/srv/scans/A.bin").unwrap();
    /// assert_eq!(artifact.name, "A.bin");
    /// assert_eq!(artifact.source_dir, Path::new("/srv/scans"));
    ///
    /// assert!(ArtifactRef::parse("A.bin").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, String> {
        let path = raw.trim();
        if path.is_empty() {
            return Err("empty artifact path".to_string());
        }

        let Some(idx) = path.rfind(['/', '\\']) else {
            return Err(format!("artifact path '{path}' has no directory separator"));
        };

        let name = &path[idx + 1..];
        if name.is_empty() {
            return Err(format!("artifact path '{path}' has an empty file name"));
        }

        // "/A.bin" lives in the root directory
        let dir = if idx == 0 { &path[..1] } else { &path[..idx] };

        Ok(Self {
            name: name.to_string(),
            source_dir: PathBuf::from(dir),
        })
    }

    /// Full path of the source file
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.name)
    }
}

/// Note recorded when a later record references an already-resolved name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConflict {
    /// Artifact base name
    pub name: String,

    /// Source directory that was kept (first resolution)
    pub kept_dir: PathBuf,

    /// Source directory that was dropped
    pub dropped_dir: PathBuf,

    /// Record whose reference was dropped
    pub record_id: RecordId,
}

/// Unique artifact name to source directory mapping
///
/// Iteration follows first-seen order, but nothing downstream relies on it:
/// the partitioner sorts by name before slicing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMap {
    entries: IndexMap<String, PathBuf>,
}

impl ArtifactMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an artifact unless its name is already present
    ///
    /// Returns `None` when inserted, or the directory that was kept when the
    /// name already existed.
    pub fn insert_first(&mut self, artifact: ArtifactRef) -> Option<&Path> {
        if self.entries.contains_key(&artifact.name) {
            return self.entries.get(&artifact.name).map(PathBuf::as_path);
        }
        self.entries.insert(artifact.name, artifact.source_dir);
        None
    }

    /// Source directory for a name
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Returns true if the name is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of unique artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no artifacts
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over (name, source dir) in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, dir)| (name.as_str(), dir.as_path()))
    }
}

/// One artifact assigned to a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Base name / archive entry name
    pub name: String,

    /// Source directory
    pub source_dir: PathBuf,
}

impl BatchEntry {
    /// Full path of the source file
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.name)
    }
}

/// Ordered, bounded slice of the artifact map destined for one archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based, contiguous index within the run
    pub index: usize,

    /// Entries in name-ascending order
    pub entries: Vec<BatchEntry>,
}

impl Batch {
    /// Number of artifacts in the batch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in batch order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}
