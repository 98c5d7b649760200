//! Integration tests for configuration loading and validation
//!
//! Tests that set environment variables hold `ENV_MUTEX` so they never
//! observe each other's overrides.

use packrat::config::load_config;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let file = config_file(
        r#"
[application]
log_level = "debug"
dry_run = true

[export]
output_directory = "/srv/exports"
archive_prefix = "nightly"
batch_size = 250
parallelism = 8
stop_on_first_failure = true
batch_timeout_secs = 600
compression_level = 6

[store]
records_path = "/srv/records.json"

[verification]
enable_verification = true

[logging]
local_enabled = true
local_path = "/tmp/packrat-logs"
local_rotation = "hourly"
local_max_size_mb = 50
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(config.export.output_directory, "/srv/exports");
    assert_eq!(config.export.archive_prefix, "nightly");
    assert_eq!(config.export.batch_size, 250);
    assert_eq!(config.export.parallelism, 8);
    assert!(config.export.stop_on_first_failure);
    assert_eq!(config.export.batch_timeout_secs, Some(600));
    assert_eq!(config.export.compression_level, 6);
    assert_eq!(config.store.records_path, "/srv/records.json");
    assert!(config.verification.enable_verification);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let file = config_file(
        r#"
[export]
output_directory = "./out"

[store]
records_path = "./records.json"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.export.archive_prefix, "export");
    assert_eq!(config.export.batch_size, 500);
    assert_eq!(config.export.parallelism, 4);
    assert_eq!(config.export.batch_timeout_secs, None);
    assert!(!config.verification.enable_verification);
}

#[test]
fn test_env_var_substitution_and_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("PACKRAT_IT_EXPORT_ROOT", "/mnt/archive");
    std::env::set_var("PACKRAT_EXPORT_BATCH_SIZE", "42");

    let file = config_file(
        r#"
[export]
output_directory = "${PACKRAT_IT_EXPORT_ROOT}/nightly"

[store]
records_path = "./records.json"
"#,
    );
    let loaded = load_config(file.path());

    std::env::remove_var("PACKRAT_IT_EXPORT_ROOT");
    std::env::remove_var("PACKRAT_EXPORT_BATCH_SIZE");

    let config = loaded.unwrap();
    assert_eq!(config.export.output_directory, "/mnt/archive/nightly");
    assert_eq!(config.export.batch_size, 42);
}

#[test]
fn test_missing_env_var_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let file = config_file(
        r#"
[export]
output_directory = "${PACKRAT_IT_NEVER_SET}"

[store]
records_path = "./records.json"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("PACKRAT_IT_NEVER_SET"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let file = config_file(
        r#"
[export]
output_directory = "./out"
batch_size = 0

[store]
records_path = "./records.json"
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(load_config("/nonexistent/packrat.toml").is_err());
}
