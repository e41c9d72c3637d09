//! Identifiers and value types shared by the stores.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height as reported by the blockchain state provider
pub type BlockHeight = u32;

/// Height up to which a color's history has been scanned
pub type ScanHeight = BlockHeight;

/// Opaque string describing a color's issuance and propagation rule
pub type ColorDescriptor = String;

/// Compact integer standing in for a [`ColorDescriptor`] inside storage.
///
/// Assigned once per descriptor by [`ColorMetaStore`](crate::ColorMetaStore)
/// and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorId(pub u32);

impl ColorId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ColorId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for ColorId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.0)))
    }
}

impl FromSql for ColorId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        u32::try_from(raw)
            .map(ColorId)
            .map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// Reference to a transaction output: (transaction hash, output index).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Transaction hash as stored by the ledger (hex text)
    pub txhash: String,
    /// Output index within the transaction
    pub outindex: u32,
}

impl OutputRef {
    pub fn new(txhash: impl Into<String>, outindex: u32) -> Self {
        Self {
            txhash: txhash.into(),
            outindex,
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txhash, self.outindex)
    }
}

/// Color value carried by an output: an amount and an optional label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorValue {
    pub value: f64,
    pub label: Option<String>,
}

impl ColorValue {
    pub fn new(value: f64, label: Option<String>) -> Self {
        Self { value, label }
    }

    /// Value with a label attached
    pub fn labeled(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: Some(label.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_color_id_sql_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        let id: ColorId = conn
            .query_row("SELECT ?1", [ColorId(42)], |row| row.get(0))
            .unwrap();
        assert_eq!(id, ColorId(42));
    }

    #[test]
    fn test_color_id_rejects_negative() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<ColorId> = conn.query_row("SELECT -1", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_output_ref_display() {
        assert_eq!(OutputRef::new("ab12", 3).to_string(), "ab12:3");
    }
}
