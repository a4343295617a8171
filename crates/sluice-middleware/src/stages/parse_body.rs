//! Content-type aware body decoding.

use std::sync::Arc;

use http::StatusCode;
use sluice_core::{RouteError, RouteResult, Stage};
use sluice_extract::{decode, negotiate, ContentKind, Decoded};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::route::RouteValidation;

/// Decodes the body with the first declared kind matching the request.
///
/// Skipped when the route declares no body type or when an earlier middleware
/// already attached a body. JSON, url-encoded and XML bodies are decoded in
/// full; multipart bodies are exposed as a lazy part stream.
#[derive(Debug, Clone)]
pub struct ParseBody {
    validation: Arc<RouteValidation>,
}

impl ParseBody {
    /// Creates the stage for one route.
    #[must_use]
    pub fn new(validation: Arc<RouteValidation>) -> Self {
        Self { validation }
    }

    fn no_match(&self) -> RouteError {
        let expected: Vec<&str> = self.validation.types.iter().map(ContentKind::as_str).collect();
        RouteError::decode(
            StatusCode::BAD_REQUEST,
            format!("expected {} but no match", expected.join(",")),
        )
    }

    fn parse(&self, ctx: &mut RequestContext) -> RouteResult<()> {
        let Some(kind) = negotiate(ctx.headers(), &self.validation.types) else {
            return Err(self.no_match());
        };

        let body = ctx.take_raw_body();
        let decoded = decode(kind, ctx.headers(), body, &self.validation.decode)
            .map_err(|err| RouteError::decode(err.status_code(), err.to_string()))?;

        debug!(kind = %kind, "request body decoded");
        match decoded {
            Decoded::Value(value) => ctx.request.set_body(value),
            Decoded::Parts(parts) => ctx.request.set_parts(parts),
        }
        Ok(())
    }
}

impl Middleware for ParseBody {
    fn name(&self) -> &'static str {
        "parse_body"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            if self.validation.types.is_empty() || ctx.request.is_body_parsed() {
                return next.run(ctx).await;
            }

            if let Err(err) = self.parse(ctx) {
                if !self.validation.continue_on_error {
                    return Err(err);
                }
                warn!(stage = %Stage::Type, error = %err, "body decoding failed, continuing");
                ctx.capture(Stage::Type, &err);
            }

            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header;
    use serde_json::json;
    use sluice_extract::{ByteSize, DecodeOptions};

    fn ctx(content_type: Option<&str>, body: &'static [u8]) -> RequestContext {
        let mut builder = http::Request::builder().method("POST").uri("/items");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        RequestContext::from_request(builder.body(Bytes::from_static(body)).unwrap())
    }

    fn stage(types: &[ContentKind], continue_on_error: bool) -> ParseBody {
        ParseBody::new(Arc::new(RouteValidation {
            types: types.to_vec(),
            continue_on_error,
            ..RouteValidation::default()
        }))
    }

    #[tokio::test]
    async fn test_json_body_decoded() {
        let mut ctx = ctx(Some("application/json"), br#"{"name":"widget"}"#);
        stage(&[ContentKind::Json], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap();
        assert_eq!(ctx.request.body(), Some(&json!({"name": "widget"})));
    }

    #[tokio::test]
    async fn test_form_body_decoded() {
        let mut ctx = ctx(Some("application/x-www-form-urlencoded"), b"name=widget&tag=a&tag=b");
        stage(&[ContentKind::Json, ContentKind::UrlEncoded], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap();
        assert_eq!(ctx.request.body(), Some(&json!({"name": "widget", "tag": ["a", "b"]})));
    }

    #[tokio::test]
    async fn test_no_match_is_400() {
        let mut ctx = ctx(Some("text/plain"), b"hello");
        let err = stage(&[ContentKind::Json, ContentKind::Multipart], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "expected json,multipart/* but no match");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_no_match() {
        let mut ctx = ctx(None, b"{}");
        let err = stage(&[ContentKind::Json], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "expected json but no match");
    }

    #[tokio::test]
    async fn test_decode_error_captured_under_type() {
        let mut ctx = ctx(Some("application/json"), b"{not json");
        stage(&[ContentKind::Json], true)
            .process(&mut ctx, Next::end())
            .await
            .unwrap();

        let captured = ctx.invalid().unwrap().get(Stage::Type).unwrap();
        assert_eq!(captured.status, StatusCode::BAD_REQUEST);
        assert!(ctx.request.body().is_none());
    }

    #[tokio::test]
    async fn test_limit_enforced() {
        let mut ctx = ctx(Some("application/json"), br#"{"name":"a long enough value"}"#);
        let stage = ParseBody::new(Arc::new(RouteValidation {
            types: vec![ContentKind::Json],
            decode: DecodeOptions {
                limit: Some(ByteSize::new(8)),
                ..DecodeOptions::default()
            },
            ..RouteValidation::default()
        }));
        let err = stage.process(&mut ctx, Next::end()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_already_parsed_body_is_kept() {
        let mut ctx = ctx(Some("application/json"), b"{\"from\":\"wire\"}");
        ctx.request.set_body(json!({"from": "upstream"}));
        stage(&[ContentKind::Json], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap();
        assert_eq!(ctx.request.body(), Some(&json!({"from": "upstream"})));
    }

    #[tokio::test]
    async fn test_other_multipart_subtype_is_no_match() {
        let mut ctx = ctx(Some("multipart/mixed; boundary=XYZ"), b"--XYZ--\r\n");
        let err = stage(&[ContentKind::Multipart], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "expected multipart/* but no match");
    }

    #[tokio::test]
    async fn test_multipart_exposes_parts() {
        let body: &'static [u8] = b"--XYZ\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nreport\r\n--XYZ--\r\n";
        let mut ctx = ctx(Some("multipart/form-data; boundary=XYZ"), body);
        stage(&[ContentKind::Multipart], false)
            .process(&mut ctx, Next::end())
            .await
            .unwrap();

        let parts = ctx.request.parts_mut().unwrap();
        assert!(parts.next_file().await.unwrap().is_none());
        assert_eq!(parts.fields()["title"], "report");
    }
}
