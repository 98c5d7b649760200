//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output
//! - JSON-formatted log files with daily or hourly rotation
//! - Configurable log levels, overridable through `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use packrat::logging::init_logging;
//! use packrat::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use packrat::log_export_start;
///
/// log_export_start!("nightly_20250101", 12);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($run_name:expr, $records:expr) => {
        tracing::info!(
            run_name = %$run_name,
            records = $records,
            "Starting export"
        );
    };
}

/// Log the completion of an export run
///
/// # Example
///
/// ```no_run
/// use packrat::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(3, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($archives:expr, $duration:expr) => {
        tracing::info!(
            archives = $archives,
            duration_ms = $duration.as_millis() as u64,
            "Export finished"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use packrat::log_error_with_context;
/// use packrat::domain::PackratError;
///
/// let error = PackratError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log progress through the batches of a run
///
/// # Example
///
/// ```no_run
/// use packrat::log_batch_processing;
///
/// log_batch_processing!(2, 10);
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Batch completed"
        );
    };
}
