//! Loading store configuration from files.

use colorcoin_config::{ConfigError, JournalMode, StoreConfig, SynchronousMode};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("colorcoin.toml");
    fs::write(
        &path,
        r#"
path = "data/mainnet-color.db"
journal_mode = "memory"
synchronous = "full"
busy_timeout_ms = 250
color_data_table = "mainnet_colordata"
"#,
    )
    .unwrap();

    let config = StoreConfig::load(&path).unwrap();
    assert_eq!(config.path.to_str(), Some("data/mainnet-color.db"));
    assert_eq!(config.journal_mode, JournalMode::Memory);
    assert_eq!(config.synchronous, SynchronousMode::Full);
    assert_eq!(config.busy_timeout_ms, 250);
    assert_eq!(config.color_data_table, "mainnet_colordata");
}

#[test]
fn test_empty_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();

    assert_eq!(StoreConfig::load(&path).unwrap(), StoreConfig::default());
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = StoreConfig::load(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_unknown_journal_mode_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, r#"journal_mode = "truncate""#).unwrap();

    assert!(matches!(StoreConfig::load(&path), Err(ConfigError::Parse(_))));
}
