//! Color value cache.
//!
//! Stores the values computed by the scan engine, one row per
//! (color id, output). A missing row for a color whose history has been
//! scanned past the output's block means the output carries none of that
//! color.

use crate::types::{ColorId, ColorValue, OutputRef, ScanHeight};
use crate::{Database, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, trace};

const UPSERT_SCAN_HEIGHT: &str =
    "INSERT OR REPLACE INTO builder_state(color_id, height) VALUES (?1, ?2)";

/// SQL text for one cache table
struct Queries {
    put: String,
    remove: String,
    remove_color: String,
    get: String,
    get_all_for_output: String,
    get_all_for_color: String,
}

impl Queries {
    fn for_table(table: &str) -> Self {
        Self {
            put: format!(
                "INSERT OR REPLACE INTO {table}(color_id, txhash, outindex, value, label) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            remove: format!(
                "DELETE FROM {table} WHERE color_id = ?1 AND txhash = ?2 AND outindex = ?3"
            ),
            remove_color: format!("DELETE FROM {table} WHERE color_id = ?1"),
            get: format!(
                "SELECT value, label FROM {table} \
                 WHERE color_id = ?1 AND txhash = ?2 AND outindex = ?3"
            ),
            get_all_for_output: format!(
                "SELECT color_id, value, label FROM {table} \
                 WHERE txhash = ?1 AND outindex = ?2 ORDER BY color_id"
            ),
            get_all_for_color: format!(
                "SELECT txhash, outindex, value, label FROM {table} \
                 WHERE color_id = ?1 ORDER BY txhash, outindex"
            ),
        }
    }
}

/// Durable cache of color values keyed by (color id, output)
pub struct ColorDataStore {
    db: Database,
    queries: Queries,
}

impl ColorDataStore {
    /// Opens the cache table configured on `db`.
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            queries: Queries::for_table(db.color_data_table()),
        }
    }

    /// Upserts the value of `color_id` on `output`.
    pub fn put(&self, color_id: ColorId, output: &OutputRef, value: &ColorValue) -> Result<()> {
        let conn = self.db.lock();
        self.insert(&conn, color_id, output, value)?;
        trace!(target: "colorcoin", %color_id, %output, value = value.value, "color value stored");
        Ok(())
    }

    /// Upserts several values of one color in a single transaction.
    pub fn put_many(&self, color_id: ColorId, entries: &[(OutputRef, ColorValue)]) -> Result<()> {
        self.db.transaction(|tx| {
            for (output, value) in entries {
                self.insert(tx, color_id, output, value)?;
            }
            Ok(())
        })?;
        debug!(target: "colorcoin", %color_id, count = entries.len(), "color values stored");
        Ok(())
    }

    /// Removes the value of `color_id` on `output`; absent rows are ignored.
    pub fn remove(&self, color_id: ColorId, output: &OutputRef) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            &self.queries.remove,
            params![color_id, output.txhash, output.outindex],
        )?;
        Ok(())
    }

    /// Removes every cached value of a color, returning how many rows went.
    pub fn remove_all_for_color(&self, color_id: ColorId) -> Result<usize> {
        let conn = self.db.lock();
        let removed = conn.execute(&self.queries.remove_color, params![color_id])?;
        debug!(target: "colorcoin", %color_id, removed, "color values removed");
        Ok(removed)
    }

    pub fn get(&self, color_id: ColorId, output: &OutputRef) -> Result<Option<ColorValue>> {
        let conn = self.db.lock();
        let value = conn
            .query_row(
                &self.queries.get,
                params![color_id, output.txhash, output.outindex],
                |row| Ok(ColorValue::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(value)
    }

    /// Every color recorded for `output`, ordered by color id.
    pub fn get_all_for_output(&self, output: &OutputRef) -> Result<Vec<(ColorId, ColorValue)>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(&self.queries.get_all_for_output)?;
        let rows = stmt
            .query_map(params![output.txhash, output.outindex], |row| {
                Ok((row.get(0)?, ColorValue::new(row.get(1)?, row.get(2)?)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every output recorded for `color_id`.
    pub fn get_all_for_color(&self, color_id: ColorId) -> Result<Vec<(OutputRef, ColorValue)>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(&self.queries.get_all_for_color)?;
        let rows = stmt
            .query_map(params![color_id], |row| {
                Ok((
                    OutputRef::new(row.get::<_, String>(0)?, row.get(1)?),
                    ColorValue::new(row.get(2)?, row.get(3)?),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Stores the values found by a scan and advances the color's watermark.
    ///
    /// Both happen in one transaction, so a reader that sees `height` also
    /// sees every value written for it.
    pub fn record_scan(
        &self,
        color_id: ColorId,
        entries: &[(OutputRef, ColorValue)],
        height: ScanHeight,
    ) -> Result<()> {
        self.db.transaction(|tx| {
            for (output, value) in entries {
                self.insert(tx, color_id, output, value)?;
            }
            tx.execute(UPSERT_SCAN_HEIGHT, params![color_id, height])?;
            Ok(())
        })?;
        debug!(target: "colorcoin", %color_id, height, count = entries.len(), "scan recorded");
        Ok(())
    }

    /// Drops all cached values and the watermark of a color in one transaction.
    ///
    /// Used after a chain reorganization so the scan engine rebuilds the color
    /// from scratch.
    pub fn reset_color(&self, color_id: ColorId) -> Result<usize> {
        let removed = self.db.transaction(|tx| {
            let removed = tx.execute(&self.queries.remove_color, params![color_id])?;
            tx.execute("DELETE FROM builder_state WHERE color_id = ?1", params![color_id])?;
            Ok(removed)
        })?;
        debug!(target: "colorcoin", %color_id, removed, "color reset");
        Ok(removed)
    }

    fn insert(
        &self,
        conn: &Connection,
        color_id: ColorId,
        output: &OutputRef,
        value: &ColorValue,
    ) -> Result<()> {
        let mut stmt = conn.prepare_cached(&self.queries.put)?;
        stmt.execute(params![
            color_id,
            output.txhash,
            output.outindex,
            value.value,
            value.label
        ])?;
        Ok(())
    }
}

impl std::fmt::Debug for ColorDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorDataStore").field("db", &self.db).finish()
    }
}
