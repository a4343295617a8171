//! Route declarations.
//!
//! A [`RouteSpec`] is plain data: where the route lives, which methods it
//! answers, the handlers it runs, and an optional [`ValidateSpec`] contract.
//! Nothing is checked until a `RouteSpec` is compiled.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_extract::{ByteSize, MultipartConfig};
use sluice_middleware::output::ResponseContract;
use sluice_middleware::BoxedMiddleware;

/// Where a route lives.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// Router path syntax: `/users/:id`, `/users/{id}`, `/files/*rest`.
    Literal(String),
    /// A regular expression; named groups become path parameters.
    Pattern(Regex),
}

impl RoutePath {
    /// The path as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(path) => path,
            Self::Pattern(regex) => regex.as_str(),
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::Literal(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self::Literal(path)
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Declared methods: one whitespace-separated string, or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSpec {
    /// `"get post"`.
    Words(String),
    /// `["get", "post"]`.
    List(Vec<String>),
}

impl MethodSpec {
    /// The declared entries, before validation.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Self::Words(words) => words.split_whitespace().collect(),
            Self::List(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for MethodSpec {
    fn from(words: &str) -> Self {
        Self::Words(words.to_string())
    }
}

impl From<String> for MethodSpec {
    fn from(words: String) -> Self {
        Self::Words(words)
    }
}

impl From<Vec<String>> for MethodSpec {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<Vec<&str>> for MethodSpec {
    fn from(list: Vec<&str>) -> Self {
        Self::List(list.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MethodSpec {
    fn from(list: [&str; N]) -> Self {
        Self::List(list.iter().map(|m| (*m).to_string()).collect())
    }
}

impl From<&http::Method> for MethodSpec {
    fn from(method: &http::Method) -> Self {
        Self::Words(method.as_str().to_string())
    }
}

/// A route handler, or a nested group of them.
#[derive(Clone)]
pub enum Handler {
    /// An async middleware.
    Middleware(BoxedMiddleware),
    /// A handler that suspends and resumes on its own schedule instead of
    /// awaiting `next`. Never accepted by the compiler.
    Generator(String),
    /// Handlers run in order, flattened at compile time.
    Group(Vec<Handler>),
}

impl Handler {
    /// Declares a generator-style handler by name.
    pub fn generator(name: impl Into<String>) -> Self {
        Self::Generator(name.into())
    }
}

impl From<BoxedMiddleware> for Handler {
    fn from(middleware: BoxedMiddleware) -> Self {
        Self::Middleware(middleware)
    }
}

impl From<Vec<Handler>> for Handler {
    fn from(handlers: Vec<Handler>) -> Self {
        Self::Group(handlers)
    }
}

impl From<Vec<BoxedMiddleware>> for Handler {
    fn from(handlers: Vec<BoxedMiddleware>) -> Self {
        Self::Group(handlers.into_iter().map(Self::Middleware).collect())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Middleware(middleware) => write!(f, "Middleware({})", middleware.name()),
            Self::Generator(name) => write!(f, "Generator({name})"),
            Self::Group(handlers) => f.debug_list().entries(handlers).finish(),
        }
    }
}

/// One value or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// The values as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

/// The `output` block of a validation contract.
///
/// ```json
/// { "200": { "body": {...} }, "400-499": { "body": {...} } }
/// ```
///
/// or `{ "ignore": true }` to skip output validation for the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Skip output validation for this route.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
    /// Response contracts keyed by status matcher, in declaration order.
    #[serde(flatten)]
    pub rules: IndexMap<String, ResponseContract>,
}

/// The validation contract of a route.
///
/// Usually written as JSON:
///
/// ```
/// use serde_json::json;
/// use sluice::ValidateSpec;
///
/// let validate: ValidateSpec = serde_json::from_value(json!({
///     "type": "json",
///     "maxBody": "64kb",
///     "body": {"type": "object", "required": ["name"]},
///     "output": {"201": {"body": {"type": "object"}}}
/// }))
/// .unwrap();
/// assert_eq!(validate.max_body.unwrap().bytes(), 64 * 1024);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidateSpec {
    /// Schema of the request headers (lowercase names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Value>,
    /// Schema of the query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    /// Schema of the path parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Schema of the decoded body. Requires `type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Response contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSpec>,
    /// Accepted body types: `json`, `form`, `xml`, `multipart`, `stream`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<OneOrMany<String>>,
    /// Size limit of fully buffered bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body: Option<ByteSize>,
    /// Always wrap XML child elements in arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_array: Option<bool>,
    /// Keep the XML root element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_root: Option<bool>,
    /// Multipart limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart_options: Option<MultipartConfig>,
    /// Status answered when an input fails validation. Defaults to 400.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<u16>,
    /// Capture failures on the request instead of aborting.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continue_on_error: bool,
}

/// Validation contract and documentation for the method shortcuts.
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    /// Validation contract.
    pub validate: Option<ValidateSpec>,
    /// Opaque documentation payload.
    pub meta: Option<Value>,
}

impl From<ValidateSpec> for RouteConfig {
    fn from(validate: ValidateSpec) -> Self {
        Self {
            validate: Some(validate),
            meta: None,
        }
    }
}

/// A declared route.
///
/// ```
/// use serde_json::json;
/// use sluice::{from_fn, RouteSpec};
///
/// let spec = RouteSpec::new("get post", "/users/:id", from_fn("show", |ctx, next| {
///     Box::pin(async move {
///         ctx.response.set_body(json!({"ok": true}));
///         next.run(ctx).await
///     })
/// }))
/// .with_meta(json!({"summary": "Show a user"}));
/// assert_eq!(spec.path.as_str(), "/users/:id");
/// ```
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// Route path.
    pub path: RoutePath,
    /// Methods the route answers.
    pub method: MethodSpec,
    /// Handlers, run after the validation stages.
    pub handler: Handler,
    /// Validation contract.
    pub validate: Option<ValidateSpec>,
    /// Opaque documentation payload, passed through unchanged.
    pub meta: Option<Value>,
}

impl RouteSpec {
    /// Declares a route without a validation contract.
    pub fn new(
        method: impl Into<MethodSpec>,
        path: impl Into<RoutePath>,
        handler: impl Into<Handler>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            handler: handler.into(),
            validate: None,
            meta: None,
        }
    }

    /// Sets the validation contract.
    #[must_use]
    pub fn with_validate(mut self, validate: ValidateSpec) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Sets the documentation payload.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Applies a shortcut configuration.
    #[must_use]
    pub fn with_config(mut self, config: RouteConfig) -> Self {
        self.validate = config.validate;
        self.meta = config.meta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_middleware::from_fn;

    fn noop() -> BoxedMiddleware {
        from_fn("noop", |ctx, next| Box::pin(async move { next.run(ctx).await }))
    }

    #[test]
    fn test_method_entries() {
        assert_eq!(MethodSpec::from(" get\tPOST ").entries(), vec!["get", "POST"]);
        assert_eq!(MethodSpec::from(["put", "patch"]).entries(), vec!["put", "patch"]);
        assert_eq!(MethodSpec::from(&http::Method::DELETE).entries(), vec!["DELETE"]);
    }

    #[test]
    fn test_route_path() {
        assert_eq!(RoutePath::from("/a/:b").as_str(), "/a/:b");
        let pattern = RoutePath::from(Regex::new(r"^/v(?P<version>\d+)/ping$").unwrap());
        assert!(matches!(pattern, RoutePath::Pattern(_)));
        assert_eq!(pattern.to_string(), r"^/v(?P<version>\d+)/ping$");
    }

    #[test]
    fn test_handler_debug_names() {
        let handler = Handler::from(vec![Handler::from(noop()), Handler::generator("legacy")]);
        assert_eq!(format!("{handler:?}"), "[Middleware(noop), Generator(legacy)]");
    }

    #[test]
    fn test_validate_spec_from_json() {
        let validate: ValidateSpec = serde_json::from_value(json!({
            "type": ["json", "form"],
            "query": {"type": "object"},
            "failure": 422,
            "continueOnError": true,
            "xmlArray": true,
            "multipartOptions": {"maxFields": 3},
            "output": {
                "200": {"body": {"type": "object"}},
                "4xx": {"headers": {"type": "object"}}
            }
        }))
        .unwrap();

        assert_eq!(validate.kind.as_ref().unwrap().as_slice(), ["json", "form"]);
        assert_eq!(validate.failure, Some(422));
        assert!(validate.continue_on_error);
        assert_eq!(validate.xml_array, Some(true));
        assert_eq!(validate.multipart_options.unwrap().max_fields, 3);

        let output = validate.output.unwrap();
        assert!(!output.ignore);
        assert_eq!(output.rules.keys().collect::<Vec<_>>(), vec!["200", "4xx"]);
    }

    #[test]
    fn test_output_ignore() {
        let output: OutputSpec = serde_json::from_value(json!({"ignore": true})).unwrap();
        assert!(output.ignore);
        assert!(output.rules.is_empty());
    }

    #[test]
    fn test_unknown_validate_key_rejected() {
        let result = serde_json::from_value::<ValidateSpec>(json!({"bodyy": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_single_type() {
        let validate: ValidateSpec = serde_json::from_value(json!({"type": "XML"})).unwrap();
        assert_eq!(validate.kind.unwrap().as_slice(), ["XML"]);
    }
}
