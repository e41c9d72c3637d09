//! Color registry and scan-height watermarks.
//!
//! Maps color descriptors to compact [`ColorId`]s (append-only, one id per
//! descriptor) and keeps, per color, the height up to which the scan engine
//! has persisted color values.

use crate::record_store::RecordStore;
use crate::types::{ColorDescriptor, ColorId, ScanHeight};
use crate::{Database, Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, trace};

/// Registry of color descriptors and per-color scan state
#[derive(Debug, Clone)]
pub struct ColorMetaStore {
    db: Database,
}

impl ColorMetaStore {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Returns the id for `color_desc`, allocating one on first sight.
    ///
    /// Known descriptors are answered by a lookup alone. An ignored insert
    /// still advances the AUTOINCREMENT sequence, so the insert only runs on a
    /// miss. It relies on the unique index over `color_desc`: a caller on
    /// another connection that loses the race has its insert ignored and
    /// reads back the winner's id.
    pub fn resolve_or_create(&self, color_desc: &str) -> Result<ColorId> {
        if color_desc.is_empty() {
            return Err(Error::InvalidDescriptor(
                "descriptor must not be empty".to_string(),
            ));
        }

        let conn = self.db.lock();
        if let Some(color_id) = Self::lookup(&conn, color_desc)? {
            return Ok(color_id);
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO color_map(color_desc) VALUES (?1)",
            params![color_desc],
        )?;
        let color_id = Self::lookup(&conn, color_desc)?.ok_or_else(|| {
            Error::InvalidDescriptor(format!("descriptor {color_desc} vanished after insert"))
        })?;

        if inserted > 0 {
            debug!(target: "colorcoin", %color_id, color_desc, "allocated color id");
        }
        Ok(color_id)
    }

    fn lookup(conn: &Connection, color_desc: &str) -> Result<Option<ColorId>> {
        let mut stmt = conn.prepare_cached("SELECT color_id FROM color_map WHERE color_desc = ?1")?;
        let color_id = stmt
            .query_row(params![color_desc], |row| row.get(0))
            .optional()?;
        Ok(color_id)
    }

    /// Reverse lookup of [`resolve_or_create`](Self::resolve_or_create).
    pub fn find_descriptor(&self, color_id: ColorId) -> Result<Option<ColorDescriptor>> {
        let conn = self.db.lock();
        let desc = conn
            .query_row(
                "SELECT color_desc FROM color_map WHERE color_id = ?1",
                params![color_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(desc)
    }

    /// All registered colors, ordered by id.
    pub fn list_colors(&self) -> Result<Vec<(ColorId, ColorDescriptor)>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT color_id, color_desc FROM color_map ORDER BY color_id")?;
        let colors = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(colors)
    }

    /// Scan watermark for a color, `None` if it was never scanned.
    pub fn get_scan_height(&self, color_id: ColorId) -> Result<Option<ScanHeight>> {
        let conn = self.db.lock();
        let height = conn
            .query_row(
                "SELECT height FROM builder_state WHERE color_id = ?1",
                params![color_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(height)
    }

    /// Scan watermark with "never scanned" read as height 0.
    pub fn scan_height_or_zero(&self, color_id: ColorId) -> Result<ScanHeight> {
        Ok(self.get_scan_height(color_id)?.unwrap_or(0))
    }

    /// Overwrites the scan watermark for a color.
    ///
    /// No ordering check is made: the scan engine is trusted to call this only
    /// after the values covering `height` are persisted, and a lower height
    /// than the current one is accepted. Engines that want both steps in one
    /// transaction use [`ColorDataStore::record_scan`](crate::ColorDataStore::record_scan).
    pub fn set_scan_height(&self, color_id: ColorId, height: ScanHeight) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT OR REPLACE INTO builder_state(color_id, height) VALUES (?1, ?2)",
            params![color_id, height],
        )?;
        trace!(target: "colorcoin", %color_id, height, "scan height set");
        Ok(())
    }

    /// Opens the record store for `namespace` on the same database.
    pub fn get_record_store(&self, namespace: &str) -> Result<RecordStore> {
        RecordStore::new(&self.db, namespace)
    }
}
