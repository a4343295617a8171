//! HTTP request and response types used at the dispatch boundary.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use sluice_core::RouteError;

/// The HTTP request type accepted by dispatch.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by dispatch.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates a JSON error response with the standard envelope.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;

    /// Renders a route error as its JSON envelope.
    fn from_route_error(err: &RouteError) -> Response;
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl ResponseExt for Response {
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message,
                "status": status.as_u16()
            }
        });
        json_response(status, body.to_string().into_bytes())
    }

    fn from_route_error(err: &RouteError) -> Response {
        let body = serde_json::to_vec(&err.to_envelope()).unwrap_or_default();
        json_response(err.status_code(), body)
    }
}
