//! # Sluice Extract
//!
//! Request-part decoding for Sluice routes.
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`decode`] | body + declared [`ContentKind`] | [`Decoded`] value or lazy [`Parts`] |
//! | [`decode_json`] / [`decode_form`] / [`decode_xml`] | full body | JSON value |
//! | [`query_map`] | request URI | JSON object |
//! | [`header_map`] | header map | JSON object |
//! | [`Cookies::from_headers`] | header map | cookie jar |
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{header, HeaderMap, HeaderValue};
//! use sluice_extract::{decode, negotiate, ContentKind, DecodeOptions, Decoded};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
//!
//! let kind = negotiate(&headers, &[ContentKind::Json]).unwrap();
//! let decoded = decode(kind, &headers, Bytes::from_static(b"{\"id\":1}"), &DecodeOptions::default()).unwrap();
//! let Decoded::Value(body) = decoded else { unreachable!() };
//! assert_eq!(body["id"], 1);
//! ```
//!
//! Failures are [`ExtractionError`]s carrying a 400, 413 or 415 status.

#![doc(html_root_url = "https://docs.rs/sluice-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod content;
mod cookie;
mod error;
mod form;
mod header;
mod json;
mod limit;
mod multipart;
mod xml;

pub use content::{content_type, negotiate, ContentKind};
pub use cookie::Cookies;
pub use error::{ExtractionError, ExtractionSource};
pub use form::{decode_form, query_map};
pub use header::{header_map, headers_from_map};
pub use json::decode_json;
pub use limit::{ByteSize, ParseByteSizeError, DEFAULT_FORM_LIMIT, DEFAULT_JSON_LIMIT, DEFAULT_XML_LIMIT};
pub use multipart::{Field, MultipartConfig, Parts, UploadedFile};
pub use xml::{decode_xml, XmlOptions};

use bytes::Bytes;
use http::HeaderMap;
use serde_json::Value;

/// Decoder settings for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Limit for json, url-encoded and xml bodies; per-kind default if unset.
    pub limit: Option<ByteSize>,
    /// XML layout options.
    pub xml: XmlOptions,
    /// Multipart limits.
    pub multipart: MultipartConfig,
}

impl DecodeOptions {
    /// The effective limit for a fully buffered kind.
    #[must_use]
    pub fn limit_for(&self, kind: ContentKind) -> usize {
        if let Some(limit) = self.limit {
            return limit.bytes();
        }
        match kind {
            ContentKind::Json => DEFAULT_JSON_LIMIT,
            ContentKind::UrlEncoded => DEFAULT_FORM_LIMIT,
            ContentKind::Xml => DEFAULT_XML_LIMIT,
            ContentKind::Multipart => self.multipart.max_body_size,
        }
    }
}

/// A decoded request body.
#[derive(Debug)]
pub enum Decoded {
    /// A fully decoded body.
    Value(Value),
    /// A lazily decoded multipart body.
    Parts(Parts),
}

/// Decodes a request body with the decoder for `kind`.
pub fn decode(
    kind: ContentKind,
    headers: &HeaderMap,
    body: Bytes,
    options: &DecodeOptions,
) -> Result<Decoded, ExtractionError> {
    let limit = options.limit_for(kind);
    match kind {
        ContentKind::Json => decode_json(&body, limit).map(Decoded::Value),
        ContentKind::UrlEncoded => decode_form(&body, limit).map(Decoded::Value),
        ContentKind::Xml => decode_xml(&body, limit, options.xml).map(Decoded::Value),
        ContentKind::Multipart => {
            Parts::from_request(headers, body, options.multipart.clone()).map(Decoded::Parts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_limit_defaults_per_kind() {
        let options = DecodeOptions::default();
        assert_eq!(options.limit_for(ContentKind::Json), DEFAULT_JSON_LIMIT);
        assert_eq!(options.limit_for(ContentKind::UrlEncoded), DEFAULT_FORM_LIMIT);

        let options = DecodeOptions {
            limit: Some(ByteSize::new(10)),
            ..DecodeOptions::default()
        };
        assert_eq!(options.limit_for(ContentKind::Xml), 10);
    }

    #[test]
    fn test_decode_respects_limit() {
        let options = DecodeOptions {
            limit: Some(ByteSize::new(4)),
            ..DecodeOptions::default()
        };
        let err = decode(
            ContentKind::Json,
            &HeaderMap::new(),
            Bytes::from_static(b"{\"long\":true}"),
            &options,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_decode_form() {
        let decoded = decode(
            ContentKind::UrlEncoded,
            &HeaderMap::new(),
            Bytes::from_static(b"a=1"),
            &DecodeOptions::default(),
        )
        .unwrap();
        assert!(matches!(decoded, Decoded::Value(v) if v["a"] == "1"));
    }
}
