//! Domain models and types for Packrat.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`AccountId`])
//! - **Records and lifecycle** ([`ExportRecord`], [`RecordState`], [`RecordOutcome`])
//! - **Artifacts and batches** ([`ArtifactRef`], [`ArtifactMap`], [`Batch`])
//! - **Error types** ([`PackratError`], [`StoreError`], [`ArchiveError`], [`SkipReason`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use packrat::domain::{ArtifactMap, ArtifactRef};
//!
//! let mut map = ArtifactMap::new();
//! map.insert_first(ArtifactRef::parse("/srv/scans/A.bin").unwrap());
//! // A second reference to the same base name is dropped
//! let kept = map.insert_first(ArtifactRef::parse("/srv/other/A.bin").unwrap());
//! assert!(kept.is_some());
//! assert_eq!(map.len(), 1);
//! ```

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use artifact::{ArtifactConflict, ArtifactMap, ArtifactRef, Batch, BatchEntry};
pub use errors::{ArchiveError, PackratError, SkipReason, StoreError};
pub use ids::{AccountId, RecordId};
pub use record::{ExportRecord, RecordOutcome, RecordState};
pub use result::Result;
