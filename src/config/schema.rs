//! Configuration schema types
//!
//! This module defines the configuration structure for Packrat.

use serde::{Deserialize, Serialize};

/// Main Packrat configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackratConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Record store settings
    pub store: StoreConfig,

    /// Archive verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PackratConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.store.validate()?;
        self.verification.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (plan archives, write nothing)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory archives are published to
    pub output_directory: String,

    /// Prefix of generated run names (`<prefix>_<timestamp>`)
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Maximum artifacts per archive
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of archives built concurrently
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Stop dispatching new batches after the first failed batch
    #[serde(default)]
    pub stop_on_first_failure: bool,

    /// Per-batch deadline in seconds (no deadline when unset)
    #[serde(default)]
    pub batch_timeout_secs: Option<u64>,

    /// Deflate level, 0 (store) to 9 (smallest)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_directory.trim().is_empty() {
            return Err("export.output_directory cannot be empty".to_string());
        }

        if self.archive_prefix.trim().is_empty() {
            return Err("export.archive_prefix cannot be empty".to_string());
        }

        if self
            .archive_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(format!(
                "export.archive_prefix '{}' must not contain path separators",
                self.archive_prefix
            ));
        }

        if self.batch_size == 0 || self.batch_size > 100_000 {
            return Err(format!(
                "export.batch_size must be between 1 and 100000, got {}",
                self.batch_size
            ));
        }

        if self.parallelism == 0 || self.parallelism > 64 {
            return Err(format!(
                "export.parallelism must be between 1 and 64, got {}",
                self.parallelism
            ));
        }

        if self.batch_timeout_secs == Some(0) {
            return Err("export.batch_timeout_secs must be > 0 when set".to_string());
        }

        if self.compression_level > 9 {
            return Err(format!(
                "export.compression_level must be <= 9, got {}",
                self.compression_level
            ));
        }

        Ok(())
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding records and their artifact references
    pub records_path: String,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.records_path.trim().is_empty() {
            return Err("store.records_path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Archive verification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationConfig {
    /// Reopen each published archive and record its checksum
    #[serde(default)]
    pub enable_verification: bool,
}

impl VerificationConfig {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Maximum log file size in MB
    #[serde(default = "default_local_max_size_mb")]
    pub local_max_size_mb: usize,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_max_size_mb == 0 {
            return Err("logging.local_max_size_mb must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            local_max_size_mb: default_local_max_size_mb(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_archive_prefix() -> String {
    "export".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_parallelism() -> usize {
    4
}

fn default_compression_level() -> u32 {
    1
}

fn default_local_path() -> String {
    "/var/log/packrat".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_local_max_size_mb() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_config() -> ExportConfig {
        ExportConfig {
            output_directory: "/srv/exports".to_string(),
            archive_prefix: default_archive_prefix(),
            batch_size: default_batch_size(),
            parallelism: default_parallelism(),
            stop_on_first_failure: false,
            batch_timeout_secs: None,
            compression_level: default_compression_level(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_validation() {
        let mut config = export_config();
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(config.validate().is_err());

        config.batch_size = 100_001;
        assert!(config.validate().is_err());

        config.batch_size = 10;
        config.parallelism = 0;
        assert!(config.validate().is_err());

        config.parallelism = 65;
        assert!(config.validate().is_err());

        config.parallelism = 2;
        config.compression_level = 10;
        assert!(config.validate().is_err());

        config.compression_level = 0;
        config.batch_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.batch_timeout_secs = Some(30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_export_config_rejects_bad_prefix() {
        let mut config = export_config();
        config.archive_prefix = "nightly/run".to_string();
        assert!(config.validate().is_err());

        config.archive_prefix = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_requires_output_directory() {
        let mut config = export_config();
        config.output_directory = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_validation() {
        let config = StoreConfig {
            records_path: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_verification_config_default() {
        let config = VerificationConfig::default();
        assert!(!config.enable_verification);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.local_enabled);
        assert_eq!(config.local_path, "/var/log/packrat");
        assert_eq!(config.local_rotation, "daily");
        assert_eq!(config.local_max_size_mb, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_rejects_unknown_rotation() {
        let config = LoggingConfig {
            local_rotation: "size".to_string(),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_archive_prefix(), "export");
        assert_eq!(default_batch_size(), 500);
        assert_eq!(default_parallelism(), 4);
        assert_eq!(default_compression_level(), 1);
    }
}
