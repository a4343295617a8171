//! Error types for Sluice.
//!
//! Two families of errors exist:
//!
//! - compile time: [`SpecError`] and [`ConfigError`], wrapped by [`CompileError`].
//!   They abort route registration and never reach a client.
//! - request time: [`RouteError`]. Every variant maps to an HTTP status and
//!   renders as an [`ErrorEnvelope`]:
//!
//! ```json
//! { "error": { "code": "VALIDATION_ERROR", "message": "...", "status": 400, "details": { } } }
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SchemaViolation;
use crate::Stage;

/// Result type alias using [`RouteError`].
pub type RouteResult<T> = Result<T, RouteError>;

/// A single schema violation inside a validated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// JSON pointer into the validated value (empty for the root).
    pub path: String,
    /// Human-readable, possibly localized, message.
    pub message: String,
    /// Schema keyword that failed (e.g. `type`, `required`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl Issue {
    /// Creates an issue without a keyword.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            keyword: None,
        }
    }

    /// Sets the schema keyword.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}

/// A request field failed its declared schema.
///
/// Carries the route's configured failure status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Which request field was being validated.
    pub stage: Stage,
    /// Status the route answers with (the `failure` option, 400 by default).
    pub status: StatusCode,
    /// Summary message.
    pub message: String,
    /// Individual violations.
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Builds a validation error from a schema violation.
    #[must_use]
    pub fn from_violation(stage: Stage, status: StatusCode, violation: SchemaViolation) -> Self {
        Self {
            stage,
            status,
            message: violation.message,
            issues: violation.issues,
        }
    }
}

/// A route declaration is malformed.
///
/// `field` names the offending part of the declaration, e.g. `method` or
/// `validate.body`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid route spec: {field}: {reason}")]
pub struct SpecError {
    /// Offending declaration field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl SpecError {
    /// Creates a new spec error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// An output contract cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two output rules accept at least one common status code.
    #[error("output rules `{first}` and `{second}` overlap")]
    OverlappingOutputRules {
        /// Status matcher of the earlier rule.
        first: String,
        /// Status matcher of the later rule.
        second: String,
    },

    /// A status matcher could not be parsed.
    #[error("invalid status matcher `{input}`: {reason}")]
    InvalidStatus {
        /// The matcher as declared.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid status matcher error.
    #[must_use]
    pub fn invalid_status(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStatus {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure while compiling a route declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The declaration itself is malformed.
    #[error(transparent)]
    Spec(#[from] SpecError),
    /// The output contract is ambiguous or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Request-time error.
///
/// Produced by the validation pipeline or raised by handlers.
#[derive(Error, Debug)]
pub enum RouteError {
    /// The body could not be decoded (400, 413 or 415).
    #[error("{message}")]
    Decode {
        /// HTTP status to answer with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// An input field failed its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The produced response broke the declared output contract (always 500).
    #[error("{message}")]
    OutputContract {
        /// Human-readable error message.
        message: String,
        /// Individual violations, if any.
        issues: Vec<Issue>,
    },

    /// An HTTP error raised by a handler.
    #[error("{message}")]
    Http {
        /// HTTP status to answer with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// Internal handler failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl RouteError {
    /// Creates a decode error.
    #[must_use]
    pub fn decode(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Decode {
            status,
            message: message.into(),
        }
    }

    /// Creates an output contract violation.
    #[must_use]
    pub fn output_contract(message: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self::OutputContract {
            message: message.into(),
            issues,
        }
    }

    /// Creates an HTTP error with the given status.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a 404 error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { status, .. } | Self::Http { status, .. } => *status,
            Self::Validation(err) => err.status,
            Self::OutputContract { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode { status, .. } => match *status {
                StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                _ => "INVALID_BODY",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OutputContract { .. } => "OUTPUT_CONTRACT_VIOLATION",
            Self::Http { status, .. } => match *status {
                StatusCode::NOT_FOUND => "NOT_FOUND",
                StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
                _ => "HTTP_ERROR",
            },
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                status: self.status_code().as_u16(),
                details: self.error_details(),
            },
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(err) => Some(serde_json::json!({
                "stage": err.stage,
                "issues": err.issues,
            })),
            Self::OutputContract { issues, .. } if !issues.is_empty() => {
                Some(serde_json::json!({ "issues": issues }))
            }
            _ => None,
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
