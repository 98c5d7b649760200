//! Core business logic for Packrat.
//!
//! # Modules
//!
//! - [`export`] - Resolution, partitioning, archive writing and coordination
//! - [`verification`] - Post-publish archive verification with checksums
//!
//! # Export Workflow
//!
//! 1. **Resolve**: Fetch artifact references for every record and collapse
//!    duplicate names (first source wins)
//! 2. **Partition**: Sort artifacts by name and slice them into batches
//! 3. **Mark**: Move every record to `processing`
//! 4. **Archive**: Build one zip per batch on a bounded worker pool, publishing
//!    each through an atomic rename
//! 5. **Report**: Mark records `processed` or `errored` and return a
//!    [`PipelineResult`](export::PipelineResult)
//!
//! # Example
//!
//! ```rust,no_run
//! use packrat::adapters::store::{JsonFileRecordStore, RecordStore};
//! use packrat::core::export::{ExportCoordinator, ExportOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn RecordStore> = Arc::new(JsonFileRecordStore::open("records.json").await?);
//! let records = store.fetch_pending_records().await?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let options = ExportOptions::new("/srv/exports", "nightly");
//! let coordinator = ExportCoordinator::new(store, options, shutdown_rx);
//!
//! let result = coordinator.run(records).await?;
//! println!("Archives: {}", result.succeeded_batches());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod verification;
