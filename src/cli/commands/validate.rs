//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Packrat configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Output Directory: {}", config.export.output_directory);
        println!("  Archive Prefix: {}", config.export.archive_prefix);
        println!("  Batch Size: {}", config.export.batch_size);
        println!("  Parallelism: {}", config.export.parallelism);
        println!(
            "  Stop On First Failure: {}",
            config.export.stop_on_first_failure
        );
        println!(
            "  Batch Timeout: {}",
            config
                .export
                .batch_timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "none".to_string())
        );
        println!("  Compression Level: {}", config.export.compression_level);
        println!("  Records File: {}", config.store.records_path);
        println!(
            "  Verification: {}",
            config.verification.enable_verification
        );
        println!();
        Ok(0)
    }
}
