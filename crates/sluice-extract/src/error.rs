//! Decoding error types.

use http::StatusCode;
use std::fmt;

/// Where decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Query string.
    Query,
    /// Request body.
    Body,
    /// Request headers.
    Header,
    /// The Content-Type header specifically.
    ContentType,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// A request part could not be decoded.
///
/// ```rust
/// use sluice_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::payload_too_large(1024, 4096);
/// assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
/// assert_eq!(err.extraction_source(), ExtractionSource::Body);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Malformed payload
    DeserializationFailed,
    /// Body (or a multipart field) over its limit
    PayloadTooLarge,
    /// Multipart part count over its limit
    TooManyParts,
    /// Content-Type not handled by the decoder
    UnsupportedMediaType,
    /// Content-Type present but unusable
    InvalidContentType,
}

impl ExtractionError {
    /// Creates an error for a malformed payload.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to parse {source}: {error}"),
        }
    }

    /// Creates an error for a payload over its limit.
    #[must_use]
    pub fn payload_too_large(limit: usize, actual: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("request entity too large: limit {limit} bytes, got {actual} bytes"),
        }
    }

    /// Creates an error for a multipart body with too many parts.
    #[must_use]
    pub fn too_many_parts(limit: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::TooManyParts,
            message: format!("too many multipart fields (limit {limit})"),
        }
    }

    /// Creates an error for a content type the decoder does not handle.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or("none");
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!("unsupported content type: expected '{expected}', got '{actual}'"),
        }
    }

    /// Creates an error for an unusable Content-Type header.
    #[must_use]
    pub fn invalid_content_type(details: impl Into<String>) -> Self {
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::InvalidContentType,
            message: format!("invalid content type: {}", details.into()),
        }
    }

    /// Returns where decoding failed.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::DeserializationFailed
            | ExtractionErrorKind::InvalidContentType => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::PayloadTooLarge | ExtractionErrorKind::TooManyParts => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ExtractionErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ExtractionErrorKind::TooManyParts => "TOO_MANY_PARTS",
            ExtractionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ExtractionErrorKind::InvalidContentType => "INVALID_CONTENT_TYPE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}
