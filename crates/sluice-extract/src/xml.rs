//! XML body decoding into JSON values.
//!
//! The mapping follows the common xml2js layout:
//!
//! - attributes go under `"$"`,
//! - text of an element that also has attributes or children goes under `"_"`,
//! - an element with only text becomes a string,
//! - repeated children become arrays.
//!
//! ```rust
//! use bytes::Bytes;
//! use sluice_extract::{decode_xml, XmlOptions};
//!
//! let body = Bytes::from_static(b"<user id=\"7\"><name>Ada</name></user>");
//! let value = decode_xml(&body, 1024, XmlOptions::default()).unwrap();
//! assert_eq!(value["$"]["id"], "7");
//! assert_eq!(value["name"], "Ada");
//! ```

use bytes::Bytes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ExtractionError, ExtractionSource};

const ATTR_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// XML decoder options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlOptions {
    /// Always wrap child elements in arrays.
    pub explicit_array: bool,
    /// Keep the root element as the single top-level key.
    pub explicit_root: bool,
}

#[derive(Debug)]
struct Frame {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, ExtractionError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| malformed(e.to_string()))?;
            attrs.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut object = Map::new();
        if !self.attrs.is_empty() {
            object.insert(ATTR_KEY.to_string(), Value::Object(self.attrs));
        }
        object.extend(self.children);
        if !self.text.is_empty() {
            object.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(object))
    }

    fn add_child(&mut self, name: String, value: Value, explicit_array: bool) {
        match self.children.get_mut(&name) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if explicit_array => {
                self.children.insert(name, Value::Array(vec![value]));
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

fn malformed(details: impl Into<String>) -> ExtractionError {
    ExtractionError::deserialization_failed(ExtractionSource::Body, format!("invalid XML: {}", details.into()))
}

/// Decodes an XML body.
///
/// An empty body decodes to `null`.
pub fn decode_xml(body: &Bytes, limit: usize, options: XmlOptions) -> Result<Value, ExtractionError> {
    if body.len() > limit {
        return Err(ExtractionError::payload_too_large(limit, body.len()));
    }

    let text = std::str::from_utf8(body).map_err(|e| malformed(format!("invalid UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| malformed(e.to_string()))?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                let frame = Frame::open(&start)?;
                finish(frame, &mut stack, &mut root, options);
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| malformed("unexpected closing tag"))?;
                finish(frame, &mut stack, &mut root, options);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }

    Ok(match root {
        None => Value::Null,
        Some((name, value)) if options.explicit_root => {
            let mut wrapper = Map::new();
            wrapper.insert(name, value);
            Value::Object(wrapper)
        }
        Some((_, value)) => value,
    })
}

fn finish(frame: Frame, stack: &mut [Frame], root: &mut Option<(String, Value)>, options: XmlOptions) {
    let (name, value) = frame.close();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value, options.explicit_array),
        None => *root = Some((name, value)),
    }
}
