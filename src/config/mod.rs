//! Configuration management for Packrat.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Packrat uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PACKRAT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use packrat::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("packrat.toml")?;
//!
//! println!("Output: {}", config.export.output_directory);
//! println!("Batch size: {}", config.export.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`ExportConfig`] - Output directory, batching, parallelism, timeouts
//! - [`StoreConfig`] - Records file consumed by the file-backed store
//! - [`VerificationConfig`] - Post-publish archive verification
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! output_directory = "/srv/exports"
//! archive_prefix = "nightly"
//! batch_size = 500
//! parallelism = 4
//!
//! [store]
//! records_path = "${PACKRAT_RECORDS}"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, PackratConfig, StoreConfig,
    VerificationConfig,
};
