//! Namespaced key/value dictionaries.
//!
//! Each namespace lives in its own `<namespace>_dict` table. Values are opaque
//! bytes; the core never interprets them.

use crate::serialization::{BincodeCodec, ValueCodec};
use crate::{Database, Error, Result};
use colorcoin_config::{is_sqlite_internal_name, is_valid_identifier, RECORD_STORE_SUFFIX};
use rusqlite::{params, OptionalExtension};
use std::marker::PhantomData;
use tracing::trace;

/// Opaque byte dictionary sharing the store's database
#[derive(Debug, Clone)]
pub struct RecordStore {
    db: Database,
    namespace: String,
    table: String,
}

impl RecordStore {
    /// Opens the dictionary `namespace`, creating its table if needed.
    pub fn new(db: &Database, namespace: &str) -> Result<Self> {
        if !is_valid_identifier(namespace) {
            return Err(Error::InvalidNamespace(namespace.to_string()));
        }
        let table = format!("{namespace}{RECORD_STORE_SUFFIX}");
        if is_sqlite_internal_name(&table) {
            return Err(Error::InvalidNamespace(namespace.to_string()));
        }
        db.lock().execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (key TEXT NOT NULL PRIMARY KEY, value BLOB)"
        ))?;

        Ok(Self {
            db: db.clone(),
            namespace: namespace.to_string(),
            table,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reads the value under `key`.
    ///
    /// Returns [`Error::KeyNotFound`] when the key is absent.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let conn = self.db.lock();
        let value: Option<Vec<u8>> = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        value.ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            &format!("INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)", self.table),
            params![key, value],
        )?;
        trace!(target: "colorcoin", namespace = %self.namespace, key, len = value.len(), "record stored");
        Ok(())
    }

    /// Deletes `key`, failing with [`Error::KeyNotFound`] if it is absent.
    pub fn delete(&self, key: &str) -> Result<()> {
        let conn = self.db.lock();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", self.table),
            params![key],
        )?;
        if removed == 0 {
            return Err(Error::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        let conn = self.db.lock();
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE key = ?1", self.table),
                params![key],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All keys in the namespace, sorted.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!("SELECT key FROM {} ORDER BY key", self.table))?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.db.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Wraps this namespace with a fixed value type.
    pub fn typed<T, C: ValueCodec<T>>(self) -> TypedRecordStore<T, C> {
        TypedRecordStore::new(self)
    }
}

/// Record store whose values are all of type `T`, encoded with `C`.
pub struct TypedRecordStore<T, C = BincodeCodec> {
    inner: RecordStore,
    _marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C: ValueCodec<T>> TypedRecordStore<T, C> {
    pub fn new(inner: RecordStore) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, key: &str) -> Result<T> {
        let bytes = self.inner.get(key)?;
        C::decode(&bytes)
    }

    pub fn put(&self, key: &str, value: &T) -> Result<()> {
        let bytes = C::encode(value)?;
        self.inner.put(key, &bytes)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        self.inner.contains(key)
    }

    pub fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys()
    }

    /// The untyped store underneath
    pub fn raw(&self) -> &RecordStore {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::JsonCodec;
    use crate::types::OutputRef;

    fn store(namespace: &str) -> RecordStore {
        RecordStore::new(&Database::open_in_memory().unwrap(), namespace).unwrap()
    }

    #[test]
    fn test_basic_operations() {
        let dict = store("wallet");
        assert!(!dict.contains("utxo").unwrap());

        dict.put("utxo", &[1, 2, 3]).unwrap();
        assert!(dict.contains("utxo").unwrap());
        assert_eq!(dict.get("utxo").unwrap(), vec![1, 2, 3]);

        dict.put("utxo", &[4]).unwrap();
        assert_eq!(dict.get("utxo").unwrap(), vec![4]);

        dict.delete("utxo").unwrap();
        assert!(dict.get("utxo").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_absent_key_fails() {
        let dict = store("wallet");
        let err = dict.delete("ghost").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(ref key) if key == "ghost"));
    }

    #[test]
    fn test_list_keys_sorted() {
        let dict = store("addresses");
        for key in ["c", "a", "b"] {
            dict.put(key, key.as_bytes()).unwrap();
        }
        assert_eq!(dict.list_keys().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(dict.len().unwrap(), 3);
        assert!(!dict.is_empty().unwrap());
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let first = RecordStore::new(&db, "first").unwrap();
        let second = RecordStore::new(&db, "second").unwrap();

        first.put("k", b"1").unwrap();
        assert!(!second.contains("k").unwrap());
        assert!(db.table_exists("first_dict").unwrap());
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let db = Database::open_in_memory().unwrap();
        for namespace in ["", "bad name", "x; DROP TABLE color_map", "9lives", "sqlite", "SQLite_stat"] {
            assert!(matches!(
                RecordStore::new(&db, namespace),
                Err(Error::InvalidNamespace(_))
            ));
        }
    }

    #[test]
    fn test_empty_value_is_stored() {
        let dict = store("flags");
        dict.put("empty", &[]).unwrap();
        assert_eq!(dict.get("empty").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_typed_store_bincode() {
        let typed: TypedRecordStore<Vec<u32>> = TypedRecordStore::new(store("heights"));
        typed.put("scan", &vec![100, 200]).unwrap();
        assert_eq!(typed.get("scan").unwrap(), vec![100, 200]);
        assert_eq!(typed.list_keys().unwrap(), vec!["scan"]);
    }

    #[test]
    fn test_typed_store_json() {
        let typed = store("outputs").typed::<OutputRef, JsonCodec>();
        let output = OutputRef::new("aa", 7);
        typed.put("last", &output).unwrap();
        assert_eq!(typed.get("last").unwrap(), output);
        assert_eq!(typed.raw().get("last").unwrap(), br#"{"txhash":"aa","outindex":7}"#.to_vec());

        typed.delete("last").unwrap();
        assert!(!typed.contains("last").unwrap());
    }

    #[test]
    fn test_typed_store_surfaces_decode_failure() {
        let raw = store("mixed");
        raw.put("garbage", b"\xff\xfe").unwrap();
        let typed = raw.typed::<OutputRef, JsonCodec>();
        assert!(matches!(typed.get("garbage"), Err(Error::Serialization(_))));
    }
}
