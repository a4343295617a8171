//! One status-keyed response contract.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_core::{CompileError, CompiledSchema, RouteError, SchemaService, SpecError};
use sluice_extract::{header_map, headers_from_map};

use super::status::StatusSpec;
use crate::context::{ResponseBody, ResponseData};

/// Declared schemas for responses under one status matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseContract {
    /// Schema of the response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Schema of the response headers (lowercase names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
}

/// A compiled response contract.
#[derive(Clone)]
pub struct OutputRule {
    status: StatusSpec,
    body: Option<Arc<dyn CompiledSchema>>,
    headers: Option<Arc<dyn CompiledSchema>>,
}

impl OutputRule {
    /// Creates a rule from already compiled schemas.
    pub fn new(
        status: &str,
        body: Option<Arc<dyn CompiledSchema>>,
        headers: Option<Arc<dyn CompiledSchema>>,
    ) -> Result<Self, CompileError> {
        Ok(Self {
            status: status.parse()?,
            body,
            headers,
        })
    }

    /// Compiles a declared contract.
    pub fn compile(
        service: &dyn SchemaService,
        status: &str,
        contract: &ResponseContract,
    ) -> Result<Self, CompileError> {
        let compile = |field: &str, definition: &Option<Value>| {
            definition
                .as_ref()
                .map(|definition| {
                    service.compile(definition).map_err(|err| {
                        SpecError::new(format!("validate.output.{status}.{field}"), err.to_string())
                    })
                })
                .transpose()
        };

        let body = compile("body", &contract.body)?;
        let headers = compile("headers", &contract.headers)?;
        Self::new(status, body, headers)
    }

    /// The status matcher.
    #[must_use]
    pub fn status(&self) -> &StatusSpec {
        &self.status
    }

    /// Returns true if the rule applies to `status`.
    #[must_use]
    pub fn matches(&self, status: StatusCode) -> bool {
        self.status.matches(status)
    }

    /// Returns true if some status would match both rules.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.status.overlaps(&other.status)
    }

    /// Validates headers, then body, writing coerced values back.
    pub fn validate(&self, response: &mut ResponseData, locale: Option<&str>) -> Result<(), RouteError> {
        if let Some(schema) = &self.headers {
            let headers = Value::Object(header_map(response.headers()));
            let coerced = schema.validate(headers, locale).map_err(|violation| {
                RouteError::output_contract(
                    format!("invalid response headers: {}", violation.message),
                    violation.issues,
                )
            })?;
            if let Value::Object(map) = coerced {
                let replacement = headers_from_map(&map).map_err(|err| {
                    RouteError::output_contract(format!("invalid response headers: {err}"), Vec::new())
                })?;
                let target = response.headers_mut();
                for name in replacement.keys() {
                    target.remove(name);
                }
                for (name, value) in &replacement {
                    target.append(name, value.clone());
                }
            }
        }

        if let Some(schema) = &self.body {
            let body = response.body().to_value();
            let coerced = schema.validate(body, locale).map_err(|violation| {
                RouteError::output_contract(
                    format!("invalid response body: {}", violation.message),
                    violation.issues,
                )
            })?;
            let replacement = match (response.body(), coerced) {
                (ResponseBody::Text(_), Value::String(text)) => Some(ResponseBody::Text(text)),
                (ResponseBody::Bytes(_), _) => None,
                (ResponseBody::Empty, Value::Null) => None,
                (_, value) => Some(ResponseBody::Json(value)),
            };
            if let Some(body) = replacement {
                response.replace_body(body);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for OutputRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputRule")
            .field("status", &self.status.as_str())
            .field("body", &self.body.is_some())
            .field("headers", &self.headers.is_some())
            .finish()
    }
}
