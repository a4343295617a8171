//! Compiled route data shared by the pipeline stages.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use sluice_core::{CompiledSchema, Stage};
use sluice_extract::{ContentKind, DecodeOptions};

use crate::context::RequestContext;
use crate::output::OutputValidator;

/// The read-only view of a compiled route exposed to handlers.
///
/// Built once at compile time. Each route owns its snapshot, so cloning one
/// and editing the clone leaves the route and its declaration untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSnapshot {
    /// Path as declared (a literal path or the source of a pattern).
    pub path: String,
    /// Lowercase methods.
    pub methods: Vec<String>,
    /// The validation block as declared, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate: Option<Value>,
    /// Opaque documentation payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Compiled validation rules of one route.
#[derive(Clone)]
pub struct RouteValidation {
    /// Header schema.
    pub header: Option<Arc<dyn CompiledSchema>>,
    /// Query schema.
    pub query: Option<Arc<dyn CompiledSchema>>,
    /// Path parameter schema.
    pub params: Option<Arc<dyn CompiledSchema>>,
    /// Body schema.
    pub body: Option<Arc<dyn CompiledSchema>>,
    /// Accepted body kinds, in declaration order. Empty means no body parsing.
    pub types: Vec<ContentKind>,
    /// Body decoder settings.
    pub decode: DecodeOptions,
    /// Status answered when an input fails validation.
    pub failure: StatusCode,
    /// Capture input errors on the context instead of aborting.
    pub continue_on_error: bool,
    /// Response contract, checked after the handlers.
    pub output: Option<OutputValidator>,
}

impl Default for RouteValidation {
    fn default() -> Self {
        Self {
            header: None,
            query: None,
            params: None,
            body: None,
            types: Vec::new(),
            decode: DecodeOptions::default(),
            failure: StatusCode::BAD_REQUEST,
            continue_on_error: false,
            output: None,
        }
    }
}

impl RouteValidation {
    /// The schema declared for an input stage.
    #[must_use]
    pub fn schema_for(&self, stage: Stage) -> Option<&Arc<dyn CompiledSchema>> {
        match stage {
            Stage::Header => self.header.as_ref(),
            Stage::Query => self.query.as_ref(),
            Stage::Params => self.params.as_ref(),
            Stage::Body => self.body.as_ref(),
            Stage::Type => None,
        }
    }
}

impl fmt::Debug for RouteValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteValidation")
            .field("header", &self.header.is_some())
            .field("query", &self.query.is_some())
            .field("params", &self.params.is_some())
            .field("body", &self.body.is_some())
            .field("types", &self.types)
            .field("failure", &self.failure)
            .field("continue_on_error", &self.continue_on_error)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Where the request locale comes from.
///
/// The cookie wins over the query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSource {
    /// Cookie holding the locale.
    pub cookie: Option<String>,
    /// Query parameter holding the locale.
    pub query_parameter: Option<String>,
}

impl LocaleSource {
    /// Resolves the locale of a request.
    #[must_use]
    pub fn resolve(&self, ctx: &RequestContext) -> Option<String> {
        let from_cookie = self
            .cookie
            .as_deref()
            .and_then(|name| ctx.cookies().get(name))
            .filter(|locale| !locale.is_empty());
        let from_query = || {
            self.query_parameter
                .as_deref()
                .and_then(|name| ctx.request.query.get(name))
                .and_then(Value::as_str)
                .filter(|locale| !locale.is_empty())
        };
        from_cookie.or_else(from_query).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header;

    fn ctx(uri: &str, cookie: Option<&str>) -> RequestContext {
        let mut builder = http::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        RequestContext::from_request(builder.body(Bytes::new()).unwrap())
    }

    #[test]
    fn test_cookie_wins_over_query() {
        let source = LocaleSource {
            cookie: Some("lang".into()),
            query_parameter: Some("locale".into()),
        };
        assert_eq!(
            source.resolve(&ctx("/?locale=de", Some("lang=fr"))).as_deref(),
            Some("fr")
        );
        assert_eq!(source.resolve(&ctx("/?locale=de", None)).as_deref(), Some("de"));
        assert_eq!(source.resolve(&ctx("/", None)), None);
    }

    #[test]
    fn test_unconfigured_source_resolves_nothing() {
        let source = LocaleSource::default();
        assert_eq!(source.resolve(&ctx("/?locale=de", Some("lang=fr"))), None);
    }

    #[test]
    fn test_schema_for_stage() {
        let validation = RouteValidation::default();
        assert!(validation.schema_for(Stage::Body).is_none());
        assert!(validation.schema_for(Stage::Type).is_none());
        assert_eq!(validation.failure, StatusCode::BAD_REQUEST);
    }
}
