//! # Sluice Schema
//!
//! The default [`SchemaService`](sluice_core::SchemaService) implementation.
//!
//! Values are coerced toward their declared types before validation, so the
//! string `"42"` from a query string satisfies `{"type": "integer"}` and the
//! handler sees the number `42`. Violation messages can be localized from a
//! directory of per-locale JSON files.
//!
//! ```rust
//! use serde_json::json;
//! use sluice_core::SchemaService;
//! use sluice_schema::JsonSchemaService;
//!
//! let schema = JsonSchemaService::default()
//!     .compile(&json!({"type": "object", "properties": {"page": {"type": "integer"}}}))
//!     .unwrap();
//! assert_eq!(schema.validate(json!({"page": "2"}), None).unwrap(), json!({"page": 2}));
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
mod coerce;
mod error;
mod extension;
mod service;

pub use catalog::MessageCatalog;
pub use coerce::coerce;
pub use error::{CatalogError, ExtensionError};
pub use extension::{
    DateFormats, ExtensionRegistry, FormatFn, IdentifierFormats, LoadedFormats, SchemaExtension,
    DEFAULT_EXTENSIONS,
};
pub use service::{JsonSchema, JsonSchemaService, SchemaOptions};
