//! The seam between route compilation and a schema-validation library.
//!
//! A [`SchemaService`] turns a schema definition into a [`CompiledSchema`]
//! once, at route compile time. At request time the compiled schema validates
//! a value and returns the coerced value or a [`SchemaViolation`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::error::Issue;

/// A schema definition could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SchemaError(pub String);

impl SchemaError {
    /// Creates a new schema error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A value failed its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Summary message (the first issue's message).
    pub message: String,
    /// Every violation found.
    pub issues: Vec<Issue>,
}

impl SchemaViolation {
    /// Creates a violation.
    #[must_use]
    pub fn new(message: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            message: message.into(),
            issues,
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SchemaViolation {}

/// Compiles schema definitions.
pub trait SchemaService: Send + Sync + fmt::Debug {
    /// Compiles a definition into a reusable validator.
    fn compile(&self, definition: &Value) -> Result<Arc<dyn CompiledSchema>, SchemaError>;
}

/// A compiled schema, shared read-only between requests.
pub trait CompiledSchema: Send + Sync + fmt::Debug {
    /// The definition this schema was compiled from.
    fn definition(&self) -> &Value;

    /// Validates `value`, returning the coerced value on success.
    ///
    /// `locale` selects the message catalog used for violation messages.
    fn validate(&self, value: Value, locale: Option<&str>) -> Result<Value, SchemaViolation>;
}
