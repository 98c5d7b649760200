//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "packrat.toml")]
    pub output: String,

    /// Include every setting with explanatory comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Packrat configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point store.records_path at your records file");
                println!("  3. Validate configuration: packrat validate-config");
                println!("  4. Preview the run: packrat export --dry-run");
                println!("  5. Run export: packrat export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Packrat Configuration File

[application]
log_level = "info"

[export]
output_directory = "./exports"
archive_prefix = "export"
batch_size = 500
parallelism = 4

[store]
records_path = "./records.json"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with all settings documented
    fn generate_config_with_examples() -> String {
        r#"# Packrat Configuration File
#
# Values may reference environment variables with ${VAR_NAME}. Any setting
# can also be overridden with PACKRAT_<SECTION>_<KEY>, for example
# PACKRAT_EXPORT_BATCH_SIZE=1000.

[application]
# trace, debug, info, warn, error
log_level = "info"
# Plan archives and report problems without writing anything
dry_run = false

[export]
# Directory archives are published to; created if missing
output_directory = "./exports"
# Archives are named <archive_prefix>_<timestamp>_<batch>.zip unless
# --run-name is given
archive_prefix = "export"
# Maximum artifacts per archive (1-100000)
batch_size = 500
# Archives built concurrently (1-64)
parallelism = 4
# Stop dispatching new batches after the first failed batch
stop_on_first_failure = false
# Per-batch deadline in seconds; remove for no deadline
batch_timeout_secs = 900
# Deflate level, 0 (store only) to 9 (smallest)
compression_level = 1

[store]
# JSON file with records and their artifact paths
records_path = "./records.json"

[verification]
# Reopen every published archive, check its entries and record a SHA-256
enable_verification = false

[logging]
local_enabled = true
local_path = "./logs"
# daily or hourly
local_rotation = "daily"
local_max_size_mb = 100
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_are_valid() {
        let minimal = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(minimal.export.batch_size, 500);

        let full = parse_config(&InitArgs::generate_config_with_examples()).unwrap();
        assert_eq!(full.export.batch_timeout_secs, Some(900));
        assert_eq!(full.logging.local_path, "./logs");
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("packrat.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains("[export]"));
    }
}
