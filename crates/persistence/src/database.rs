//! SQLite storage handle.
//!
//! A [`Database`] owns the single connection that every store in this crate
//! shares. Stores take a clone of the handle at construction; the connection
//! is released when the last clone is dropped or when [`Database::close`] is
//! called on the only remaining handle.

use crate::{Error, Result};
use colorcoin_config::{StoreConfig, DEFAULT_COLOR_DATA_TABLE};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared, explicitly owned SQLite handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    color_data_table: Arc<str>,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens or creates the database described by `config`.
    ///
    /// Pragmas from the config are applied and the core tables are created
    /// if they do not exist yet.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        info!(target: "colorcoin", path = ?config.path, "opening color data store");

        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let journal: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_pragma(),
            |row| row.get(0),
        )?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_pragma())?;
        debug!(target: "colorcoin", journal_mode = %journal, synchronous = %config.synchronous, "pragmas applied");

        Self::initialize(conn, &config.color_data_table, Some(config.path.clone()))
    }

    /// Creates an in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, DEFAULT_COLOR_DATA_TABLE, None)
    }

    fn initialize(conn: Connection, color_data_table: &str, path: Option<PathBuf>) -> Result<Self> {
        create_core_tables(&conn, color_data_table)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            color_data_table: Arc::from(color_data_table),
            path,
        })
    }

    /// Database file, `None` for in-memory handles
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name of the table backing [`ColorDataStore`](crate::ColorDataStore)
    pub fn color_data_table(&self) -> &str {
        &self.color_data_table
    }

    /// Checks whether a table exists.
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let conn = self.lock();
        let found = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table_name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Runs `f` inside one SQLite transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Closes the connection.
    ///
    /// Fails with [`Error::ConnectionInUse`] while any store built from this
    /// handle is still alive. On failure the handle is handed back with the
    /// error so the caller can retry once the other stores are dropped.
    pub fn close(self) -> std::result::Result<(), (Self, Error)> {
        let Database {
            conn,
            color_data_table,
            path,
        } = self;
        let mutex = match Arc::try_unwrap(conn) {
            Ok(mutex) => mutex,
            Err(conn) => {
                let db = Database {
                    conn,
                    color_data_table,
                    path,
                };
                return Err((db, Error::ConnectionInUse));
            }
        };
        if let Err((conn, err)) = mutex.into_inner().close() {
            let db = Database {
                conn: Arc::new(Mutex::new(conn)),
                color_data_table,
                path,
            };
            return Err((db, Error::Storage(err)));
        }
        info!(target: "colorcoin", path = ?path, "color data store closed");
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("color_data_table", &self.color_data_table)
            .finish()
    }
}

fn create_core_tables(conn: &Connection, color_data_table: &str) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            color_id INTEGER NOT NULL,
            txhash TEXT NOT NULL,
            outindex INTEGER NOT NULL,
            value REAL NOT NULL,
            label TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS {table}_data_idx ON {table}(color_id, txhash, outindex);
        CREATE INDEX IF NOT EXISTS {table}_output_idx ON {table}(txhash, outindex);
        CREATE TABLE IF NOT EXISTS builder_state (
            color_id INTEGER NOT NULL,
            height INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS builder_state_idx ON builder_state(color_id);
        CREATE TABLE IF NOT EXISTS color_map (
            color_id INTEGER PRIMARY KEY AUTOINCREMENT,
            color_desc TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS color_map_idx ON color_map(color_desc);",
        table = color_data_table
    ))?;
    Ok(())
}
