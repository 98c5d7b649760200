//! Export command implementation
//!
//! Runs one export: pending records are read from the configured store,
//! their artifacts are packed into archives and every record is reported
//! back as processed or errored.

use crate::adapters::store::create_record_store;
use crate::config::{load_config, PackratConfig};
use crate::core::export::{ExportCoordinator, ExportOptions, ExportPlan, PipelineResult};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - plan archives without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run name used as archive prefix (default: <archive_prefix>_<timestamp>)
    #[arg(long)]
    pub run_name: Option<String>,

    /// Override maximum artifacts per archive
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override number of archives built concurrently
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Stop dispatching new batches after the first failure
    #[arg(long)]
    pub stop_on_first_failure: bool,

    /// Write the run result as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let run_name = self.resolve_run_name(&config);
        let options = ExportOptions::from_config(&config, &run_name);
        if let Err(e) = options.validate() {
            eprintln!("Invalid export options: {e}");
            return Ok(2);
        }

        let store = match create_record_store(&config).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open record store");
                eprintln!("Failed to open record store: {e}");
                return Ok(4);
            }
        };

        let records = match store.fetch_pending_records().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch pending records");
                eprintln!("Failed to fetch pending records: {e}");
                return Ok(4);
            }
        };

        let coordinator = ExportCoordinator::new(store, options, shutdown_signal);

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no archives will be written");
            println!("🔍 DRY RUN MODE - No archives will be written");
            println!();
            let plan = match coordinator.plan(&records).await {
                Ok(plan) => plan,
                Err(e) => {
                    eprintln!("Export planning failed: {e}");
                    return Ok(2);
                }
            };
            print_plan(&plan);
            return Ok(0);
        }

        if !self.yes {
            println!("Export Configuration:");
            println!("  Run name: {run_name}");
            println!("  Output directory: {}", config.export.output_directory);
            println!("  Pending records: {}", records.len());
            println!("  Batch size: {}", config.export.batch_size);
            println!("  Parallelism: {}", config.export.parallelism);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        tracing::info!(run_name = %run_name, records = records.len(), "Executing export");
        println!("🚀 Starting export...");
        println!();

        let result = match coordinator.run(records).await {
            Ok(result) => result,
            Err(e) => {
                crate::log_error_with_context!(&e, "Export run aborted");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        print_result(&result);

        if let Some(path) = &self.report {
            let json = serde_json::to_string_pretty(&result)?;
            std::fs::write(path, json)?;
            println!("Report written to {}", path.display());
        }

        Ok(exit_code_for(&result))
    }

    fn apply_overrides(&self, config: &mut PackratConfig) {
        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.export.batch_size = batch_size;
        }
        if let Some(parallelism) = self.parallelism {
            tracing::info!(parallelism, "Overriding parallelism from CLI");
            config.export.parallelism = parallelism;
        }
        if self.stop_on_first_failure {
            config.export.stop_on_first_failure = true;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }

    fn resolve_run_name(&self, config: &PackratConfig) -> String {
        match &self.run_name {
            Some(name) => name.clone(),
            None => format!(
                "{}_{}",
                config.export.archive_prefix,
                chrono::Local::now().format("%Y%m%d%H%M%S")
            ),
        }
    }
}

/// Exit code for a completed run
pub fn exit_code_for(result: &PipelineResult) -> i32 {
    if result.interrupted {
        130
    } else if result.success {
        0
    } else {
        1
    }
}

fn exit_code_for_error(error: &crate::domain::PackratError) -> i32 {
    match error {
        crate::domain::PackratError::Configuration(_) => 2,
        crate::domain::PackratError::Store(_) => 4,
        _ => 5,
    }
}

fn print_plan(plan: &ExportPlan) {
    println!("📋 Export Plan ({}):", plan.run_name);
    println!("  Records: {}", plan.total_records);
    println!("  Unique artifacts: {}", plan.total_artifacts);
    println!("  Archives: {}", plan.archives.len());
    for archive in &plan.archives {
        println!("    - {} ({} entries)", archive.archive_name, archive.entries.len());
    }
    if !plan.conflicts.is_empty() {
        println!("  Dropped duplicate references: {}", plan.conflicts.len());
    }
    if !plan.record_problems.is_empty() {
        println!("  Records with problems:");
        for (record_id, problem) in &plan.record_problems {
            println!("    - {record_id}: {problem}");
        }
    }
    println!();
}

fn print_result(result: &PipelineResult) {
    println!();
    println!("📊 Export Summary:");
    println!("  Run name: {}", result.run_name);
    println!("  Unique artifacts: {}", result.total_artifacts);
    println!("  Archives published: {}", result.succeeded_batches());
    println!("  Batches failed: {}", result.failed_batches());
    println!("  Artifacts skipped: {}", result.skipped_artifacts());
    println!("  Records processed: {}", result.processed_records());
    println!("  Records errored: {}", result.errored_records());
    println!("  Duration: {:.2}s", result.duration_ms as f64 / 1000.0);
    println!();

    let failed: Vec<_> = result.archives.iter().filter(|a| !a.success).collect();
    if !failed.is_empty() {
        println!("⚠️  Failed batches:");
        for archive in failed.iter().take(10) {
            if let Some(error) = &archive.error {
                println!("  - {}: {}", archive.archive_name, error);
            }
        }
        if failed.len() > 10 {
            println!("  ... and {} more", failed.len() - 10);
        }
        println!();
    }

    if !result.store_failures.is_empty() {
        println!("⚠️  Record updates rejected by the store:");
        for failure in &result.store_failures {
            println!("  - {}: {}", failure.record_id, failure.message);
        }
        println!();
    }

    if result.interrupted {
        println!("⚠️  Export interrupted. Published archives are complete; errored records can be retried.");
    } else if result.success {
        println!("✅ Export completed successfully!");
    } else {
        println!("⚠️  Export completed with failures");
    }
}
