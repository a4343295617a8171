//! Per-request state.
//!
//! A [`RequestContext`] is created for each dispatched request and handed
//! mutably to every middleware of the matched route. It holds the raw request,
//! the decoded request fields that validation reads and writes back, the
//! response under construction, and the state the pipeline exposes to handlers
//! (the route snapshot and any captured input errors).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use http_body_util::Full;
use serde_json::{Map, Value};
use sluice_core::{InvalidInputs, RouteError, Stage};
use sluice_extract::{header_map, query_map, Cookies, Parts};
use uuid::Uuid;

use crate::route::RouteSnapshot;
use crate::types::Response;

/// The request fields a route validates.
///
/// `header` and `query` start as the raw strings of the request; validation
/// merges coerced values back key by key. `params` and `body` are replaced
/// wholesale by their validated values.
#[derive(Default)]
pub struct RequestData {
    /// Request headers; repeated headers are joined with `", "`.
    pub header: Map<String, Value>,
    /// Query string parameters; repeated keys become arrays.
    pub query: Map<String, Value>,
    /// Path parameters.
    pub params: Map<String, Value>,
    body: Option<Value>,
    parts: Option<Parts>,
}

impl RequestData {
    /// The decoded body, once parsed.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Sets the decoded body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// The multipart part stream, when the body is multipart.
    pub fn parts_mut(&mut self) -> Option<&mut Parts> {
        self.parts.as_mut()
    }

    /// Takes the multipart part stream.
    pub fn take_parts(&mut self) -> Option<Parts> {
        self.parts.take()
    }

    /// Sets the multipart part stream.
    pub fn set_parts(&mut self, parts: Parts) {
        self.parts = Some(parts);
    }

    /// Returns true once a body or part stream has been attached.
    #[must_use]
    pub fn is_body_parsed(&self) -> bool {
        self.body.is_some() || self.parts.is_some()
    }
}

impl fmt::Debug for RequestData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestData")
            .field("header", &self.header)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("parts", &self.parts.is_some())
            .finish()
    }
}

/// A response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl ResponseBody {
    /// The body as a JSON value, for validation.
    ///
    /// Text becomes a JSON string; empty and binary bodies become `null`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Empty | Self::Bytes(_) => Value::Null,
        }
    }

    fn default_content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json"),
            Self::Text(_) => Some("text/plain; charset=utf-8"),
            Self::Bytes(_) => Some("application/octet-stream"),
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Json(value) => Bytes::from(value.to_string()),
            Self::Text(text) => Bytes::from(text),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl From<Value> for ResponseBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

/// The response under construction.
///
/// The status starts as 404 and becomes 200 when a body is set, unless a
/// status was set explicitly.
#[derive(Debug, Clone)]
pub struct ResponseData {
    status: StatusCode,
    explicit_status: bool,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Default for ResponseData {
    fn default() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            explicit_status: false,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }
}

impl ResponseData {
    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.explicit_status = true;
    }

    /// The response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a response header, replacing existing values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// The response body.
    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// The body if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Sets the body.
    pub fn set_body(&mut self, body: impl Into<ResponseBody>) {
        self.body = body.into();
        if !self.explicit_status {
            self.status = StatusCode::OK;
        }
    }

    /// Replaces the body without touching the status.
    pub(crate) fn replace_body(&mut self, body: ResponseBody) {
        self.body = body;
    }

    /// Converts into an HTTP response.
    #[must_use]
    pub fn into_http(self) -> Response {
        let mut headers = self.headers;
        if let Some(content_type) = self.body.default_content_type() {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        let mut response = http::Response::new(Full::new(self.body.into_bytes()));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// State carried through a route chain.
pub struct RequestContext {
    request_id: Uuid,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    cookies: Cookies,
    raw_body: Bytes,
    route_params: Vec<(String, String)>,
    /// Decoded request fields.
    pub request: RequestData,
    /// The response under construction.
    pub response: ResponseData,
    route: Option<Arc<RouteSnapshot>>,
    invalid: Option<InvalidInputs>,
    locale: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"), HeaderMap::new(), Bytes::new())
    }
}

impl RequestContext {
    /// Creates a context for a request.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = query_map(&uri).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "unparseable query string ignored");
            Map::new()
        });
        let request = RequestData {
            header: header_map(&headers),
            query,
            ..RequestData::default()
        };

        Self {
            request_id: Uuid::now_v7(),
            cookies: Cookies::from_headers(&headers),
            method,
            uri,
            headers,
            raw_body: body,
            route_params: Vec::new(),
            request,
            response: ResponseData::default(),
            route: None,
            invalid: None,
            locale: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context from a buffered HTTP request.
    #[must_use]
    pub fn from_request(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    /// Unique identifier of this request.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The raw request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request cookies.
    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// The unparsed request body.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Takes the unparsed body, leaving it empty.
    pub fn take_raw_body(&mut self) -> Bytes {
        std::mem::take(&mut self.raw_body)
    }

    /// Path parameters extracted by the router, still percent-decoded strings.
    #[must_use]
    pub fn route_params(&self) -> &[(String, String)] {
        &self.route_params
    }

    /// Returns a router-extracted path parameter.
    #[must_use]
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets the router-extracted path parameters.
    pub fn set_route_params(&mut self, params: Vec<(String, String)>) {
        self.route_params = params;
    }

    /// Snapshot of the matched route, once exposed.
    #[must_use]
    pub fn route(&self) -> Option<&Arc<RouteSnapshot>> {
        self.route.as_ref()
    }

    /// Exposes the matched route.
    pub fn set_route(&mut self, route: Arc<RouteSnapshot>) {
        self.route = Some(route);
    }

    /// Input errors captured under `continueOnError`.
    #[must_use]
    pub fn invalid(&self) -> Option<&InvalidInputs> {
        self.invalid.as_ref()
    }

    /// Captures an input error for `stage`.
    pub fn capture(&mut self, stage: Stage, err: &RouteError) {
        self.invalid
            .get_or_insert_with(InvalidInputs::new)
            .capture(stage, err);
    }

    /// The locale used for validation messages.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Sets the locale used for validation messages.
    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a typed extension value mutably.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("invalid", &self.invalid)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(uri: &str) -> http::Request<Bytes> {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-trace", "abc")
            .header(header::COOKIE, "lang=fr")
            .body(Bytes::from_static(b"{}"))
            .unwrap()
    }

    #[test]
    fn test_from_request_decodes_fields() {
        let ctx = RequestContext::from_request(request("/users?page=2&tag=a&tag=b"));

        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/users");
        assert_eq!(ctx.request.query["page"], json!("2"));
        assert_eq!(ctx.request.query["tag"], json!(["a", "b"]));
        assert_eq!(ctx.request.header["x-trace"], json!("abc"));
        assert_eq!(ctx.cookies().get("lang"), Some("fr"));
        assert_eq!(ctx.raw_body(), &Bytes::from_static(b"{}"));
        assert!(!ctx.request.is_body_parsed());
    }

    #[test]
    fn test_take_raw_body() {
        let mut ctx = RequestContext::from_request(request("/"));
        assert_eq!(ctx.take_raw_body(), Bytes::from_static(b"{}"));
        assert!(ctx.raw_body().is_empty());
    }

    #[test]
    fn test_route_params() {
        let mut ctx = RequestContext::default();
        ctx.set_route_params(vec![("id".to_string(), "7".to_string())]);
        assert_eq!(ctx.route_param("id"), Some("7"));
        assert_eq!(ctx.route_param("missing"), None);
    }

    #[test]
    fn test_response_status_follows_body() {
        let mut response = ResponseData::default();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        response.set_body(json!({"ok": true}));
        assert_eq!(response.status(), StatusCode::OK);

        let mut response = ResponseData::default();
        response.set_status(StatusCode::CREATED);
        response.set_body("done");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_into_http_sets_content_type() {
        let mut response = ResponseData::default();
        response.set_body(json!([1, 2]));
        let http = response.into_http();
        assert_eq!(http.headers()[header::CONTENT_TYPE], "application/json");

        let mut response = ResponseData::default();
        response.set_header(header::CONTENT_TYPE, HeaderValue::from_static("application/hal+json"));
        response.set_body(json!({}));
        let http = response.into_http();
        assert_eq!(http.headers()[header::CONTENT_TYPE], "application/hal+json");
    }

    #[test]
    fn test_capture_creates_invalid_lazily() {
        let mut ctx = RequestContext::default();
        assert!(ctx.invalid().is_none());

        ctx.capture(Stage::Query, &RouteError::decode(StatusCode::BAD_REQUEST, "bad"));
        let invalid = ctx.invalid().unwrap();
        assert_eq!(invalid.get(Stage::Query).unwrap().msg, "bad");
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut ctx = RequestContext::default();
        assert!(ctx.get_extension::<Tenant>().is_none());

        ctx.set_extension(Tenant("acme"));
        assert_eq!(ctx.get_extension::<Tenant>(), Some(&Tenant("acme")));

        *ctx.get_extension_mut::<Tenant>().unwrap() = Tenant("globex");
        assert_eq!(ctx.remove_extension::<Tenant>(), Some(Tenant("globex")));
        assert!(ctx.get_extension::<Tenant>().is_none());
    }

    #[test]
    fn test_to_value() {
        assert_eq!(ResponseBody::Text("hi".into()).to_value(), json!("hi"));
        assert_eq!(ResponseBody::Bytes(Bytes::new()).to_value(), Value::Null);
    }
}
