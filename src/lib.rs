//! # Colorcoin: colored coin metadata cache
//!
//! Persistence and caching layer for a colored coin tracker. For outputs of
//! the ledger it records the color values that the scan engine derives, keeps
//! a registry of color descriptors, and tracks how far each color has been
//! scanned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colorcoin::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     colorcoin::init_tracing("info");
//!
//!     let config = StoreConfig::load("colorcoin.toml")?;
//!     let db = Database::open(&config)?;
//!     let meta = ColorMetaStore::new(&db);
//!
//!     let color_id = meta.resolve_or_create("obc:issuance:0:0")?;
//!     println!("color {} scanned up to {}", color_id, meta.scan_height_or_zero(color_id)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`colorcoin_config`] - Store configuration and TOML loading
//! - [`colorcoin_persistence`] - Registry, cache, record stores and resolver

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use colorcoin_config as config;
pub use colorcoin_persistence as persistence;

use tracing_subscriber::{fmt, EnvFilter};

/// Common imports for colorcoin development
pub mod prelude {
    pub use crate::config::{JournalMode, StoreConfig, SynchronousMode};
    pub use crate::persistence::{
        BlockchainState, ColorDataBuilder, ColorDataStore, ColorId, ColorMetaStore, ColorValue,
        ColorValueResolver, Database, Error, OutputRef, RecordStore, Result, TxConfirmation,
        TypedRecordStore,
    };
}

/// Installs a console tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once, or after another subscriber was installed, has no effect.
pub fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},colorcoin={default_filter}")));
    let _ = fmt().with_env_filter(env_filter).try_init();
}
