//! Url-encoded body and query string decoding.

use bytes::Bytes;
use http::Uri;
use serde_json::{Map, Value};

use crate::{ExtractionError, ExtractionSource};

/// Collects decoded pairs into a map; repeated keys become arrays.
pub(crate) fn pairs_to_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    map
}

/// Decodes an `application/x-www-form-urlencoded` body.
///
/// Values stay strings; schema validation coerces them.
///
/// ```rust
/// use bytes::Bytes;
/// use sluice_extract::decode_form;
///
/// let value = decode_form(&Bytes::from_static(b"tag=a&tag=b&q=rust"), 1024).unwrap();
/// assert_eq!(value["q"], "rust");
/// assert_eq!(value["tag"][1], "b");
/// ```
pub fn decode_form(body: &Bytes, limit: usize) -> Result<Value, ExtractionError> {
    if body.len() > limit {
        return Err(ExtractionError::payload_too_large(limit, body.len()));
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))?;
    Ok(Value::Object(pairs_to_map(pairs)))
}

/// Decodes the query string of `uri` into a map.
///
/// A missing query string yields an empty map.
pub fn query_map(uri: &Uri) -> Result<Map<String, Value>, ExtractionError> {
    let Some(query) = uri.query() else {
        return Ok(Map::new());
    };

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string()))?;
    Ok(pairs_to_map(pairs))
}
