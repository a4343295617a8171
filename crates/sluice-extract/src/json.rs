//! JSON body decoding.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::{ExtractionError, ExtractionSource};

/// Decodes a JSON body.
///
/// Only objects and arrays are accepted at the top level; an empty body
/// decodes to an empty object.
///
/// ```rust
/// use bytes::Bytes;
/// use sluice_extract::decode_json;
///
/// let value = decode_json(&Bytes::from_static(br#"{"name":"ada"}"#), 1024).unwrap();
/// assert_eq!(value["name"], "ada");
/// ```
pub fn decode_json(body: &Bytes, limit: usize) -> Result<Value, ExtractionError> {
    if body.len() > limit {
        return Err(ExtractionError::payload_too_large(limit, body.len()));
    }

    let text = std::str::from_utf8(body).map_err(|e| {
        ExtractionError::deserialization_failed(ExtractionSource::Body, format!("invalid UTF-8: {e}"))
    })?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Err(ExtractionError::deserialization_failed(
            ExtractionSource::Body,
            "invalid JSON, only supports object and array",
        ));
    }

    serde_json::from_str(trimmed).map_err(|e| {
        ExtractionError::deserialization_failed(ExtractionSource::Body, format!("invalid JSON: {e}"))
    })
}
