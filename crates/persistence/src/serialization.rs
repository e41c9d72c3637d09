//! Value codecs for typed record stores.
//!
//! A [`RecordStore`](crate::RecordStore) keeps opaque bytes. Collaborators that
//! want typed values pick a codec per namespace and wrap the store in a
//! [`TypedRecordStore`](crate::TypedRecordStore).

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts values of `T` to and from stored bytes.
pub trait ValueCodec<T> {
    fn encode(value: &T) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8]) -> Result<T>;
}

/// Compact binary encoding via `bincode`
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T: Serialize + DeserializeOwned> ValueCodec<T> for BincodeCodec {
    fn encode(value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(bytes: &[u8]) -> Result<T> {
        if bytes.is_empty() {
            return Err(Error::Serialization("Cannot deserialize empty data".to_string()));
        }
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Human-readable JSON encoding via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> ValueCodec<T> for JsonCodec {
    fn encode(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
