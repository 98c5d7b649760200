//! Export orchestration and archive building
//!
//! This module provides the core export logic for Packrat, including:
//! - Artifact resolution and deduplication
//! - Deterministic batch partitioning
//! - Atomic archive writing
//! - Run coordination and reporting

pub mod archive;
pub mod batch;
pub mod coordinator;
pub mod resolver;
pub mod summary;

pub use archive::{archive_file_name, ArchiveWriter, StagedArchive};
pub use batch::partition;
pub use coordinator::{run_export, ExportCoordinator, ExportOptions};
pub use resolver::{resolve, RecordContribution, Resolution};
pub use summary::{
    ArchiveResult, ArtifactStatusIndex, ExportPlan, PipelineResult, PlannedArchive, RecordReport,
    SkippedArtifact, StoreUpdateFailure,
};
