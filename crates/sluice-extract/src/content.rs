//! Body kinds and content-type negotiation.

use http::{header, HeaderMap};
use mime::Mime;
use std::fmt;

/// A body decoder a route can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `application/json` and `*/*+json`.
    Json,
    /// `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// `application/xml`, `text/xml` and `*/*+xml`.
    Xml,
    /// `multipart/form-data`, decoded lazily.
    Multipart,
}

impl ContentKind {
    /// Maps a declared body type (`json`, `form`, `xml`, `multipart`, `stream`)
    /// to its decoder. Case-insensitive.
    #[must_use]
    pub fn from_declared(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "form" => Some(Self::UrlEncoded),
            "xml" => Some(Self::Xml),
            "multipart" | "stream" => Some(Self::Multipart),
            _ => None,
        }
    }

    /// The decoder name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::UrlEncoded => "urlencoded",
            Self::Xml => "xml",
            Self::Multipart => "multipart/*",
        }
    }

    /// Returns true if `mime` is handled by this decoder.
    #[must_use]
    pub fn accepts(&self, mime: &Mime) -> bool {
        let (ty, sub, suffix) = (mime.type_(), mime.subtype(), mime.suffix());
        match self {
            Self::Json => {
                (ty == mime::APPLICATION && sub == mime::JSON) || suffix == Some(mime::JSON)
            }
            Self::UrlEncoded => ty == mime::APPLICATION && sub == mime::WWW_FORM_URLENCODED,
            Self::Xml => {
                ((ty == mime::APPLICATION || ty == mime::TEXT) && sub == mime::XML)
                    || suffix == Some(mime::XML)
            }
            Self::Multipart => ty == mime::MULTIPART && sub == mime::FORM_DATA,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the request's Content-Type header.
///
/// Returns `None` when the header is absent or not a valid media type.
#[must_use]
pub fn content_type(headers: &HeaderMap) -> Option<Mime> {
    headers
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Picks the first declared kind that accepts the request's content type.
#[must_use]
pub fn negotiate(headers: &HeaderMap, declared: &[ContentKind]) -> Option<ContentKind> {
    let mime = content_type(headers)?;
    declared.iter().copied().find(|kind| kind.accepts(&mime))
}
