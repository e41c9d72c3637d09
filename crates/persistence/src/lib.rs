//! # Colorcoin Persistence Layer
//!
//! Durable caching of colored-coin metadata on top of SQLite.
//!
//! Color values are expensive to derive because deriving them means walking
//! transaction history. This crate memoizes the results per (color, output)
//! pair and tracks, per color, the block height up to which history has been
//! scanned, so the scan engine only has to cover what is missing.
//!
//! ## Architecture
//!
//! - **Database**: explicitly owned SQLite handle shared by every store
//! - **RecordStore**: namespaced opaque key/value dictionaries for collaborators
//! - **ColorMetaStore**: descriptor/identifier registry and scan-height watermarks
//! - **ColorDataStore**: the color value cache keyed by color and output
//! - **ColorValueResolver**: answers "which color values does this output carry"
//!   after making sure the scan engine has covered the output's block
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use colorcoin_persistence::{ColorMetaStore, ColorDataStore, ColorValue, Database, OutputRef};
//!
//! # fn example() -> colorcoin_persistence::Result<()> {
//! let db = Database::open_in_memory()?;
//! let meta = ColorMetaStore::new(&db);
//! let cache = ColorDataStore::new(&db);
//!
//! let color_id = meta.resolve_or_create("obc:issuance:0")?;
//! let output = OutputRef::new("b1e3...", 0);
//! cache.record_scan(color_id, &[(output.clone(), ColorValue::new(50.0, None))], 100)?;
//!
//! assert_eq!(meta.get_scan_height(color_id)?, Some(100));
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// SQLite connection handle and schema
pub mod database;
/// Color value cache
pub mod color_data;
/// Color registry and scan watermarks
pub mod color_meta;
/// Namespaced key/value dictionaries
pub mod record_store;
/// Query orchestration over the cache
pub mod resolver;
/// Value codecs for typed record stores
pub mod serialization;
/// Core identifiers and value types
pub mod types;

pub use color_data::ColorDataStore;
pub use color_meta::ColorMetaStore;
pub use database::Database;
pub use record_store::{RecordStore, TypedRecordStore};
pub use resolver::{BlockchainState, ColorDataBuilder, ColorValueResolver, TxConfirmation};
pub use serialization::{BincodeCodec, JsonCodec, ValueCodec};
pub use types::{BlockHeight, ColorDescriptor, ColorId, ColorValue, OutputRef, ScanHeight};

pub use colorcoin_config::{ConfigError, StoreConfig};

use thiserror::Error;

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Persistence-specific error types.
///
/// Every error is returned to the immediate caller; nothing in this crate
/// retries or swallows a failure.
#[derive(Error, Debug)]
pub enum Error {
    /// The transaction behind an output has no confirming block yet
    #[error("cannot resolve color values: transaction {txhash} not yet confirmed")]
    NotFinal {
        /// Hash of the unconfirmed transaction
        txhash: String,
    },

    /// Key not found in a record store
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Underlying SQLite failure
    #[error("Storage fault: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Record store namespace is not a plain identifier
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Color descriptor is unusable as a registry key
    #[error("Invalid color descriptor: {0}")]
    InvalidDescriptor(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Handle cannot be closed while other stores still hold it
    #[error("Database handle is still shared by other stores")]
    ConnectionInUse,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Blockchain state provider failure
    #[error("Blockchain state error: {0}")]
    Blockchain(String),

    /// Scan engine failure
    #[error("Scan error: {0}")]
    Scan(String),
}

impl Error {
    /// True for the expected "absent key" outcome of record store reads.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }

    /// True when the caller should wait for confirmation and retry.
    pub fn is_not_final(&self) -> bool {
        matches!(self, Error::NotFinal { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
