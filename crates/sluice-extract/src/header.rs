//! Conversions between header maps and JSON objects.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde_json::{Map, Value};

use crate::{ExtractionError, ExtractionSource};

/// Converts headers to a JSON object keyed by lowercase name.
///
/// Repeated headers are joined with `", "`, except `set-cookie` which
/// becomes an array. Non-UTF-8 bytes are replaced.
#[must_use]
pub fn header_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();

        let value = if name == http::header::SET_COOKIE {
            Value::Array(values.into_iter().map(Value::String).collect())
        } else {
            Value::String(values.join(", "))
        };
        map.insert(name.as_str().to_string(), value);
    }
    map
}

/// Builds a header map back from a JSON object.
///
/// Strings, numbers and booleans become single values; arrays become
/// repeated headers. `null` entries are skipped.
pub fn headers_from_map(map: &Map<String, Value>) -> Result<HeaderMap, ExtractionError> {
    let mut headers = HeaderMap::new();
    for (name, value) in map {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Header, format!("{name}: {e}"))
        })?;

        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in items {
            let text = match item {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let header_value = HeaderValue::from_str(&text).map_err(|e| {
                ExtractionError::deserialization_failed(ExtractionSource::Header, format!("{name}: {e}"))
            })?;
            headers.append(header_name.clone(), header_value);
        }
    }
    Ok(headers)
}
