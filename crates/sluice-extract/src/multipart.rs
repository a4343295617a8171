//! Lazy multipart decoding.
//!
//! A multipart body is not buffered into a value. [`Parts`] yields file
//! fields one at a time; plain form fields met along the way are collected
//! automatically into [`Parts::fields`].
//!
//! ```rust,ignore
//! let parts = ctx.request.parts_mut().expect("multipart route");
//! while let Some(file) = parts.next_file().await? {
//!     let upload = file.into_file().await?;
//!     store(upload.file_name(), upload.data()).await?;
//! }
//! let title = parts.fields().get("title");
//! ```

use bytes::Bytes;
use http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;

use crate::{ExtractionError, ExtractionSource};

/// Default maximum total body size (50 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum size per field (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Multipart limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultipartConfig {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields, files included.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Sets the maximum field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Sets the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// The lazy part stream of a multipart request.
pub struct Parts {
    inner: multer::Multipart<'static>,
    config: MultipartConfig,
    field_count: usize,
    fields: Map<String, Value>,
}

impl Parts {
    /// Opens the part stream of a request.
    ///
    /// Fails when the Content-Type carries no boundary or the body is over
    /// `max_body_size`.
    pub fn from_request(
        headers: &HeaderMap,
        body: Bytes,
        config: MultipartConfig,
    ) -> Result<Self, ExtractionError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .ok_or_else(|| ExtractionError::unsupported_media_type("multipart/*", None))?
            .to_str()
            .map_err(|_| ExtractionError::invalid_content_type("invalid UTF-8 in Content-Type header"))?;

        let boundary = multer::parse_boundary(content_type)
            .map_err(|_| ExtractionError::invalid_content_type("missing or invalid multipart boundary"))?;

        if body.len() > config.max_body_size {
            return Err(ExtractionError::payload_too_large(config.max_body_size, body.len()));
        }

        let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });

        Ok(Self {
            inner: multer::Multipart::new(stream, boundary),
            config,
            field_count: 0,
            fields: Map::new(),
        })
    }

    /// Returns the next raw field, file or not.
    pub async fn next_field(&mut self) -> Result<Option<Field>, ExtractionError> {
        match self.inner.next_field().await {
            Ok(Some(field)) => {
                self.field_count += 1;
                if self.field_count > self.config.max_fields {
                    return Err(ExtractionError::too_many_parts(self.config.max_fields));
                }
                Ok(Some(Field::new(field, self.config.max_field_size)))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(ExtractionError::deserialization_failed(
                ExtractionSource::Body,
                format!("multipart parse error: {e}"),
            )),
        }
    }

    /// Returns the next file field, collecting plain fields passed over.
    pub async fn next_file(&mut self) -> Result<Option<Field>, ExtractionError> {
        while let Some(field) = self.next_field().await? {
            if field.file_name().is_some() {
                return Ok(Some(field));
            }
            let name = field.name().unwrap_or_default().to_string();
            let text = field.text().await?;
            push_field(&mut self.fields, name, text);
        }
        Ok(None)
    }

    /// Reads every remaining file into memory.
    pub async fn collect_files(&mut self) -> Result<Vec<UploadedFile>, ExtractionError> {
        let mut files = Vec::new();
        while let Some(field) = self.next_file().await? {
            files.push(field.into_file().await?);
        }
        Ok(files)
    }

    /// Plain form fields collected so far; repeated names become arrays.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn push_field(fields: &mut Map<String, Value>, name: String, text: String) {
    match fields.get_mut(&name) {
        Some(Value::Array(values)) => values.push(Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        None => {
            fields.insert(name, Value::String(text));
        }
    }
}

impl std::fmt::Debug for Parts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parts")
            .field("config", &self.config)
            .field("field_count", &self.field_count)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// A single multipart field.
pub struct Field {
    inner: multer::Field<'static>,
    max_size: usize,
}

impl Field {
    fn new(inner: multer::Field<'static>, max_size: usize) -> Self {
        Self { inner, max_size }
    }

    /// The form field name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    /// The client-side file name, present for file uploads.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.inner.file_name()
    }

    /// The part's Content-Type.
    #[must_use]
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.inner.content_type()
    }

    /// Reads the whole field.
    pub async fn bytes(self) -> Result<Bytes, ExtractionError> {
        let bytes = self.inner.bytes().await.map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Body, format!("failed to read field: {e}"))
        })?;

        if bytes.len() > self.max_size {
            return Err(ExtractionError::payload_too_large(self.max_size, bytes.len()));
        }
        Ok(bytes)
    }

    /// Reads the field as UTF-8 text.
    pub async fn text(self) -> Result<String, ExtractionError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Body, format!("field is not valid UTF-8: {e}"))
        })
    }

    /// Reads the field into an [`UploadedFile`].
    pub async fn into_file(self) -> Result<UploadedFile, ExtractionError> {
        let name = self.name().map(String::from);
        let file_name = self.file_name().map(String::from);
        let content_type = self.content_type().map(ToString::to_string);
        let data = self.bytes().await?;

        Ok(UploadedFile {
            name,
            file_name,
            content_type,
            data,
        })
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.inner.name())
            .field("file_name", &self.inner.file_name())
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// A file read fully into memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The form field name.
    pub name: Option<String>,
    /// The client-side file name.
    pub file_name: Option<String>,
    /// The part's MIME type.
    pub content_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl UploadedFile {
    /// The client-side file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// File content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// File size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for an empty file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
