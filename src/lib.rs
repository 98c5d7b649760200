// Packrat - Batched artifact archive exporter
// Copyright (c) 2025 Packrat Contributors
// Licensed under the MIT License

//! # Packrat - batched artifact archive exporter
//!
//! Packrat reads export records from a record store, collects the files each
//! record references, packs them into size-bounded zip archives and reports
//! every record back as processed or errored.
//!
//! ## Overview
//!
//! An export run:
//! - **Resolves** each record's artifact references into one map keyed by
//!   file base name (first reference wins, later ones are recorded as conflicts)
//! - **Partitions** the map into batches of at most `batch_size` entries
//! - **Builds** one archive per batch on a bounded worker pool; an archive is
//!   staged under a temporary name and only renamed into place once complete
//! - **Reports** a per-record outcome derived from the archives its artifacts
//!   landed in
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline and archive verification
//! - [`adapters`] - Record store implementations
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packrat::adapters::store::create_record_store;
//! use packrat::config::load_config;
//! use packrat::core::export::{ExportCoordinator, ExportOptions};
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("packrat.toml")?;
//!     let store = create_record_store(&config).await?;
//!     let records = store.fetch_pending_records().await?;
//!
//!     let options = ExportOptions::from_config(&config, "nightly");
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let coordinator = ExportCoordinator::new(store, options, shutdown_rx);
//!
//!     let result = coordinator.run(records).await?;
//!     println!(
//!         "Published {} archives, {} records errored",
//!         result.succeeded_batches(),
//!         result.errored_records()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::PackratError`]. Failures confined to a
//! single archive or artifact never abort the run; they surface as
//! [`domain::ArchiveError`] and [`domain::SkipReason`] values on the result.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
