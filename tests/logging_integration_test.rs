//! Integration tests for logging setup
//!
//! A process can install only one global subscriber, so the whole lifecycle
//! runs in a single test.

use catalog_sync::config::LoggingConfig;
use catalog_sync::domain::{SyncRun, SyncType};
use catalog_sync::logging::init_logging;
use catalog_sync::{log_ingest_checkpoint, log_run_transition};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/catalog-sync");
}

#[test]
fn test_file_logging_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "daily".to_string(),
        local_max_size_mb: 10,
    };

    assert!(init_logging("verbose", &config).is_err());
    assert!(!log_path.exists());

    let guard = init_logging("info", &config).expect("Failed to initialize logging");
    assert!(log_path.is_dir());

    let run = SyncRun::new(SyncType::OnDemand);
    log_run_transition!(&run);
    log_ingest_checkpoint!(100u64, 0u64);
    tracing::info!(target: "catalog_sync::test", "Logging test event");

    // A second subscriber cannot be installed
    assert!(init_logging("debug", &LoggingConfig::console_only()).is_err());

    drop(guard);

    let contents: String = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("catalog-sync.log"))
        .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
        .collect();

    assert!(contents.contains("Logging initialized"));
    assert!(contents.contains("Logging test event"));
    for line in contents.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.get("level").is_some());
    }
}
