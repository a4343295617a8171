//! # Sluice Core
//!
//! Core types shared by every Sluice crate.
//!
//! - [`RouteError`] - request-time failures and their JSON error envelope
//! - [`SpecError`] / [`ConfigError`] - compile-time failures of a route declaration
//! - [`Stage`] - the request fields a route can validate
//! - [`InvalidInputs`] - errors captured when a route continues on error
//! - [`SchemaService`] / [`CompiledSchema`] - the seam to the schema-validation library

#![doc(html_root_url = "https://docs.rs/sluice-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod invalid;
pub mod schema;
mod stage;

pub use error::{
    CompileError, ConfigError, ErrorDetail, ErrorEnvelope, Issue, RouteError, RouteResult,
    SpecError, ValidationError,
};
pub use invalid::{CapturedError, InvalidInputs};
pub use schema::{CompiledSchema, SchemaError, SchemaService, SchemaViolation};
pub use stage::Stage;
