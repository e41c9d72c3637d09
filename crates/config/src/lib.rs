//! Colorcoin Configuration Module
//!
//! This module provides configuration types for the color data store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default database file name
pub const DEFAULT_DB_PATH: &str = "colordb.sqlite";
/// Default table holding cached color values
pub const DEFAULT_COLOR_DATA_TABLE: &str = "colordata";
/// Default time SQLite waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`StoreConfig`]
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tables the store creates for its own use
pub const RESERVED_TABLES: &[&str] = &["builder_state", "color_map"];
/// Suffix of every record store table
pub const RECORD_STORE_SUFFIX: &str = "_dict";

/// Checks whether `name` falls in the `sqlite_` prefix SQLite keeps for itself.
pub fn is_sqlite_internal_name(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with("sqlite_")
}

/// Checks whether `name` clashes with a table SQLite or the store owns.
///
/// SQLite compares identifiers case-insensitively, so the check does too.
pub fn is_reserved_table_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    is_sqlite_internal_name(&lower)
        || lower.ends_with(RECORD_STORE_SUFFIX)
        || RESERVED_TABLES.contains(&lower.as_str())
}

/// Checks that `name` can be spliced into SQL as a bare table identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    /// Gets the pragma keyword
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalMode::Wal => write!(f, "wal"),
            JournalMode::Delete => write!(f, "delete"),
            JournalMode::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for JournalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wal" => Ok(JournalMode::Wal),
            "delete" => Ok(JournalMode::Delete),
            "memory" => Ok(JournalMode::Memory),
            _ => Err(format!("Unknown journal mode: {}", s)),
        }
    }
}

/// SQLite synchronous level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynchronousMode {
    Off,
    #[default]
    Normal,
    Full,
}

impl SynchronousMode {
    /// Gets the pragma keyword
    pub fn as_pragma(&self) -> &'static str {
        match self {
            SynchronousMode::Off => "OFF",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Full => "FULL",
        }
    }
}

impl fmt::Display for SynchronousMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynchronousMode::Off => write!(f, "off"),
            SynchronousMode::Normal => write!(f, "normal"),
            SynchronousMode::Full => write!(f, "full"),
        }
    }
}

impl FromStr for SynchronousMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(SynchronousMode::Off),
            "normal" => Ok(SynchronousMode::Normal),
            "full" => Ok(SynchronousMode::Full),
            _ => Err(format!("Unknown synchronous mode: {}", s)),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file location
    pub path: PathBuf,
    pub journal_mode: JournalMode,
    pub synchronous: SynchronousMode,
    /// How long a writer waits on another writer's lock
    pub busy_timeout_ms: u64,
    /// Table holding cached color values
    pub color_data_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            journal_mode: JournalMode::default(),
            synchronous: SynchronousMode::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            color_data_table: DEFAULT_COLOR_DATA_TABLE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a default configuration pointing at `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parses a TOML document, filling missing fields with defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects values the store cannot open with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("path must not be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !is_valid_identifier(&self.color_data_table) {
            return Err(ConfigError::Invalid(format!(
                "color_data_table '{}' is not a valid table name",
                self.color_data_table
            )));
        }
        if is_reserved_table_name(&self.color_data_table) {
            return Err(ConfigError::Invalid(format!(
                "color_data_table '{}' clashes with a reserved table",
                self.color_data_table
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.color_data_table, "colordata");
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            path = "/var/lib/colorcoin/color.db"
            journal_mode = "delete"
            "#,
        )
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/var/lib/colorcoin/color.db"));
        assert_eq!(config.journal_mode, JournalMode::Delete);
        assert_eq!(config.synchronous, SynchronousMode::Normal);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let err = StoreConfig::from_toml_str(r#"color_data_table = "data; DROP TABLE x""#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_reserved_table_names() {
        for name in ["builder_state", "color_map", "COLOR_MAP", "sqlite_sequence", "wallet_dict"] {
            let config = StoreConfig {
                color_data_table: name.to_string(),
                ..StoreConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{name} accepted"
            );
        }
        let err = StoreConfig::from_toml_str(r#"color_data_table = "builder_state""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_reserved_name_check() {
        assert!(is_reserved_table_name("sqlite_master"));
        assert!(is_reserved_table_name("Builder_State"));
        assert!(is_reserved_table_name("props_dict"));
        assert!(!is_reserved_table_name("colordata"));
        assert!(!is_reserved_table_name("dictionary"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = StoreConfig::from_toml_str("busy_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = StoreConfig::from_toml_str("path = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_valid_identifier("colordata"));
        assert!(is_valid_identifier("_wallet_state2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("a-b"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("WAL".parse::<JournalMode>().unwrap(), JournalMode::Wal);
        assert_eq!("full".parse::<SynchronousMode>().unwrap(), SynchronousMode::Full);
        assert!("fast".parse::<SynchronousMode>().is_err());
        assert_eq!(JournalMode::Memory.as_pragma(), "MEMORY");
    }

    #[test]
    fn test_mode_parsers_agree() {
        for mode in [JournalMode::Wal, JournalMode::Delete, JournalMode::Memory] {
            let text = mode.to_string();
            let via_serde: JournalMode = serde_json::from_str(&format!("\"{text}\"")).unwrap();
            assert_eq!(text.parse::<JournalMode>().unwrap(), via_serde);
        }
        assert!("mem".parse::<JournalMode>().is_err());
        assert!(serde_json::from_str::<JournalMode>("\"mem\"").is_err());
    }

    #[test]
    fn test_modes_serialize_lowercase() {
        let json = serde_json::to_string(&JournalMode::Wal).unwrap();
        assert_eq!(json, "\"wal\"");
        let mode: SynchronousMode = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(mode, SynchronousMode::Off);
    }
}
