//! Integration test for the JSON file log layer
//!
//! Installing the global subscriber can only happen once per process, so this
//! file holds a single test.

use packrat::config::LoggingConfig;
use packrat::logging::{init_logging, structured::LOG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn test_configured_local_path_receives_log_file() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_dir.to_string_lossy().into_owned(),
        local_rotation: "daily".to_string(),
        ..LoggingConfig::default()
    };

    let guard = init_logging("info", &config).unwrap();
    // A second logger cannot be installed
    assert!(init_logging("info", &config).is_err());
    drop(guard);

    let files: Vec<String> = std::fs::read_dir(&log_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(files.iter().any(|name| name.starts_with(LOG_FILE_NAME)));

    let contents: String = files
        .iter()
        .filter(|name| name.starts_with(LOG_FILE_NAME))
        .map(|name| std::fs::read_to_string(log_dir.join(name)).unwrap())
        .collect();
    assert!(contents.contains("Logging initialized"));
}
