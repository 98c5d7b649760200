//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PackratConfig;
use crate::domain::errors::PackratError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PackratConfig
/// 4. Applies environment variable overrides (PACKRAT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`PackratError::Configuration`] if the file cannot be read, a
/// referenced environment variable is not set, the TOML is malformed or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use packrat::config::loader::load_config;
///
/// let config = load_config("packrat.toml").expect("Failed to load config");
/// println!("Archives go to {}", config.export.output_directory);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PackratConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PackratError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PackratError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Runs the same substitution, override and validation steps as
/// [`load_config`].
///
/// # Errors
///
/// See [`load_config`].
pub fn parse_config(contents: &str) -> Result<PackratConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PackratConfig = toml::from_str(&contents)
        .map_err(|e| PackratError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        PackratError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PackratError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PackratError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using PACKRAT_* prefix
///
/// Environment variables follow the pattern: PACKRAT_<SECTION>_<KEY>
/// For example: PACKRAT_EXPORT_BATCH_SIZE, PACKRAT_STORE_RECORDS_PATH.
/// Values that do not parse are ignored.
fn apply_env_overrides(config: &mut PackratConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("PACKRAT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("PACKRAT_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Export overrides
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_OUTPUT_DIRECTORY") {
        config.export.output_directory = val;
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_ARCHIVE_PREFIX") {
        config.export.archive_prefix = val;
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_PARALLELISM") {
        if let Ok(parallelism) = val.parse() {
            config.export.parallelism = parallelism;
        }
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_STOP_ON_FIRST_FAILURE") {
        config.export.stop_on_first_failure = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_BATCH_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse() {
            config.export.batch_timeout_secs = Some(secs);
        }
    }
    if let Ok(val) = std::env::var("PACKRAT_EXPORT_COMPRESSION_LEVEL") {
        if let Ok(level) = val.parse() {
            config.export.compression_level = level;
        }
    }

    // Store overrides
    if let Ok(val) = std::env::var("PACKRAT_STORE_RECORDS_PATH") {
        config.store.records_path = val;
    }

    // Verification overrides
    if let Ok(val) = std::env::var("PACKRAT_VERIFICATION_ENABLE_VERIFICATION") {
        config.verification.enable_verification = val.parse().unwrap_or(false);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("PACKRAT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("PACKRAT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("PACKRAT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
