//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Packrat using clap.

pub mod commands;

use crate::config::{load_config, LoggingConfig};
use clap::{Parser, Subcommand};

/// Packrat - batched artifact archive exporter
#[derive(Parser, Debug)]
#[command(name = "packrat")]
#[command(version, about, long_about = None)]
#[command(author = "Packrat Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "packrat.toml", env = "PACKRAT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PACKRAT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level and logging settings to start the program with
    ///
    /// Commands that read the configuration file log according to its
    /// `[logging]` section and `application.log_level`; `--log-level` wins
    /// over the file. Without a readable configuration (or for `init`) logging
    /// goes to the console only, and the command reports the configuration
    /// problem itself.
    pub fn logging_settings(&self) -> (String, LoggingConfig) {
        let console_only = LoggingConfig {
            local_enabled: false,
            ..LoggingConfig::default()
        };

        let config = match self.command {
            Commands::Init(_) => None,
            _ => load_config(&self.config).ok(),
        };

        match config {
            Some(config) => (
                self.log_level
                    .clone()
                    .unwrap_or(config.application.log_level),
                config.logging,
            ),
            None => (
                self.log_level.clone().unwrap_or_else(|| "info".to_string()),
                console_only,
            ),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pack the artifacts of pending records into archives
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show records by lifecycle state
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
