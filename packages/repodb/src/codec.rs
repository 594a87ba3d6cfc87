//! JSON encoding of collection records.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Content of a freshly created collection file.
pub const EMPTY_COLLECTION: &[u8] = b"[]";

/// Serialize records as a JSON array.
pub fn encode_records<T: Serialize>(path: &str, records: &[T]) -> Result<Bytes> {
    serde_json::to_vec(records)
        .map(Bytes::from)
        .map_err(|source| Error::Encode {
            path: path.to_string(),
            source,
        })
}

/// Parse a JSON array of records. Empty content and `null` are an empty
/// collection.
pub fn decode_records<T: DeserializeOwned>(path: &str, content: &[u8]) -> Result<Vec<T>> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let records: Option<Vec<T>> =
        serde_json::from_slice(content).map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        })?;
    Ok(records.unwrap_or_default())
}

/// Re-type records by passing them through JSON.
pub fn convert_records<T: Serialize, U: DeserializeOwned>(path: &str, records: &[T]) -> Result<Vec<U>> {
    let value = serde_json::to_value(records).map_err(|source| Error::Encode {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_value(value).map_err(|source| Error::Decode {
        path: path.to_string(),
        source,
    })
}
