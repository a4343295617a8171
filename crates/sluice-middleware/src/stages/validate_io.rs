//! Input validation before the handlers, output validation after them.

use std::sync::Arc;

use serde_json::Value;
use sluice_core::{RouteError, RouteResult, Stage, ValidationError};
use tracing::{debug, error, warn};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::route::{LocaleSource, RouteValidation};

/// Validates `header`, `query`, `params` and `body`, in that order.
///
/// Coerced values are written back: `header` and `query` key by key,
/// `params` and `body` wholesale. A failing field aborts the request with the
/// route's failure status, or is captured on the context when the route
/// continues on error. A request without a decoded body skips body
/// validation. After the rest of the chain has run, the response is
/// checked against the route's output contract; any violation is a 500.
#[derive(Debug, Clone)]
pub struct ValidateIo {
    validation: Arc<RouteValidation>,
    locale: LocaleSource,
}

impl ValidateIo {
    /// Creates the stage for one route.
    #[must_use]
    pub fn new(validation: Arc<RouteValidation>, locale: LocaleSource) -> Self {
        Self { validation, locale }
    }

    fn input(ctx: &RequestContext, stage: Stage) -> Option<Value> {
        match stage {
            Stage::Header => Some(Value::Object(ctx.request.header.clone())),
            Stage::Query => Some(Value::Object(ctx.request.query.clone())),
            Stage::Params => Some(Value::Object(ctx.request.params.clone())),
            // Absent and multipart bodies have nothing to validate.
            Stage::Body => ctx.request.body().cloned(),
            Stage::Type => None,
        }
    }

    fn write_back(ctx: &mut RequestContext, stage: Stage, value: Value) {
        match (stage, value) {
            (Stage::Header, Value::Object(map)) => ctx.request.header.extend(map),
            (Stage::Query, Value::Object(map)) => ctx.request.query.extend(map),
            (Stage::Params, Value::Object(map)) => ctx.request.params = map,
            (Stage::Body, value) => ctx.request.set_body(value),
            _ => {}
        }
    }

    fn validate_input(&self, ctx: &mut RequestContext, stage: Stage) -> RouteResult<()> {
        let Some(schema) = self.validation.schema_for(stage) else {
            return Ok(());
        };
        let Some(value) = Self::input(ctx, stage) else {
            debug!(stage = %stage, "no decoded value, validation skipped");
            return Ok(());
        };

        debug!(stage = %stage, "validating input");
        let coerced = schema.validate(value, ctx.locale()).map_err(|violation| {
            RouteError::from(ValidationError::from_violation(
                stage,
                self.validation.failure,
                violation,
            ))
        })?;
        Self::write_back(ctx, stage, coerced);
        Ok(())
    }
}

impl Middleware for ValidateIo {
    fn name(&self) -> &'static str {
        "validate_io"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            let locale = self.locale.resolve(ctx);
            ctx.set_locale(locale);

            for stage in Stage::INPUTS {
                if let Err(err) = self.validate_input(ctx, stage) {
                    if !self.validation.continue_on_error {
                        return Err(err);
                    }
                    warn!(stage = %stage, error = %err, "input validation failed, continuing");
                    ctx.capture(stage, &err);
                }
            }

            next.run(ctx).await?;

            if let Some(output) = &self.validation.output {
                debug!("validating output");
                let locale = ctx.locale().map(str::to_string);
                if let Err(err) = output.validate(&mut ctx.response, locale.as_deref()) {
                    error!(
                        status = ctx.response.status().as_u16(),
                        path = %ctx.path(),
                        error = %err,
                        "response violates its output contract"
                    );
                    return Err(err);
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use crate::output::{OutputValidator, ResponseContract};
    use bytes::Bytes;
    use http::{header, StatusCode};
    use serde_json::json;
    use sluice_core::{CompiledSchema, SchemaService};
    use sluice_schema::JsonSchemaService;

    fn schema(definition: Value) -> Option<Arc<dyn CompiledSchema>> {
        Some(JsonSchemaService::default().compile(&definition).unwrap())
    }

    fn ctx(uri: &str) -> RequestContext {
        let request = http::Request::builder()
            .uri(uri)
            .header("x-version", "2")
            .body(Bytes::new())
            .unwrap();
        RequestContext::from_request(request)
    }

    fn numeric_query() -> Option<Arc<dyn CompiledSchema>> {
        schema(json!({"type": "object", "properties": {"id": {"type": "integer"}}}))
    }

    async fn run(validation: RouteValidation, ctx: &mut RequestContext) -> RouteResult<bool> {
        let stage = ValidateIo::new(Arc::new(validation), LocaleSource::default());
        let handler = from_fn("handler", |ctx, next| {
            Box::pin(async move {
                ctx.set_extension(true);
                next.run(ctx).await
            })
        });
        let chain = crate::middleware::Chain::new(vec![Arc::new(stage), handler]);
        chain.run(ctx).await?;
        Ok(ctx.get_extension::<bool>().copied().unwrap_or(false))
    }

    #[tokio::test]
    async fn test_query_coerced_and_merged() {
        let mut ctx = ctx("/items?id=42&other=x");
        let validation = RouteValidation {
            query: numeric_query(),
            ..RouteValidation::default()
        };

        assert!(run(validation, &mut ctx).await.unwrap());
        assert_eq!(ctx.request.query["id"], json!(42));
        assert_eq!(ctx.request.query["other"], json!("x"));
    }

    #[tokio::test]
    async fn test_failure_aborts_with_configured_status() {
        let mut ctx = ctx("/items?id=abc");
        let validation = RouteValidation {
            query: numeric_query(),
            failure: StatusCode::UNPROCESSABLE_ENTITY,
            ..RouteValidation::default()
        };

        let err = run(validation, &mut ctx).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(ctx.get_extension::<bool>().is_none());
    }

    #[tokio::test]
    async fn test_continue_on_error_captures() {
        let mut ctx = ctx("/items?id=abc");
        let validation = RouteValidation {
            query: numeric_query(),
            continue_on_error: true,
            ..RouteValidation::default()
        };

        assert!(run(validation, &mut ctx).await.unwrap());
        let captured = ctx.invalid().unwrap().get(Stage::Query).unwrap();
        assert_eq!(captured.status, StatusCode::BAD_REQUEST);
        assert!(!captured.msg.is_empty());
        assert_eq!(ctx.request.query["id"], json!("abc"));
    }

    #[tokio::test]
    async fn test_header_params_and_body() {
        let mut ctx = ctx("/items/7");
        ctx.request.params.insert("id".into(), json!("7"));
        ctx.request.set_body(json!({"qty": "3"}));

        let validation = RouteValidation {
            header: schema(json!({"type": "object", "properties": {"x-version": {"type": "integer"}}})),
            params: schema(json!({"type": "object", "properties": {"id": {"type": "integer"}}})),
            body: schema(json!({"type": "object", "properties": {"qty": {"type": "number"}}})),
            ..RouteValidation::default()
        };

        assert!(run(validation, &mut ctx).await.unwrap());
        assert_eq!(ctx.request.header["x-version"], json!(2));
        assert_eq!(Value::Object(ctx.request.params.clone()), json!({"id": 7}));
        assert_eq!(ctx.request.body(), Some(&json!({"qty": 3})));
    }

    #[tokio::test]
    async fn test_missing_body_skips_validation() {
        let mut ctx = ctx("/items");
        let validation = RouteValidation {
            body: schema(json!({"type": "object", "required": ["qty"]})),
            ..RouteValidation::default()
        };
        assert!(run(validation, &mut ctx).await.unwrap());
        assert!(ctx.request.body().is_none());
        assert!(ctx.invalid().is_none());
    }

    #[tokio::test]
    async fn test_decoded_body_still_validated() {
        let mut ctx = ctx("/items");
        ctx.request.set_body(json!({}));
        let validation = RouteValidation {
            body: schema(json!({"type": "object", "required": ["qty"]})),
            ..RouteValidation::default()
        };
        let err = run(validation, &mut ctx).await.unwrap_err();
        assert!(matches!(err, RouteError::Validation(ref v) if v.stage == Stage::Body));
    }

    #[tokio::test]
    async fn test_locale_from_cookie() {
        let request = http::Request::builder()
            .uri("/?lang=de")
            .header(header::COOKIE, "locale=fr")
            .body(Bytes::new())
            .unwrap();
        let mut ctx = RequestContext::from_request(request);
        let stage = ValidateIo::new(
            Arc::new(RouteValidation::default()),
            LocaleSource {
                cookie: Some("locale".into()),
                query_parameter: Some("lang".into()),
            },
        );
        stage.process(&mut ctx, Next::end()).await.unwrap();
        assert_eq!(ctx.locale(), Some("fr"));
    }

    #[tokio::test]
    async fn test_output_violation_is_500() {
        let contract: ResponseContract =
            serde_json::from_value(json!({"body": {"type": "object", "required": ["id"]}})).unwrap();
        let output =
            OutputValidator::compile(&JsonSchemaService::default(), [("200", &contract)]).unwrap();
        let validation = RouteValidation {
            output: Some(output),
            ..RouteValidation::default()
        };

        let stage = ValidateIo::new(Arc::new(validation), LocaleSource::default());
        let handler = from_fn("handler", |ctx, _next| {
            Box::pin(async move {
                ctx.response.set_body(json!({"name": "no id"}));
                Ok(())
            })
        });
        let chain = crate::middleware::Chain::new(vec![Arc::new(stage), handler]);

        let mut ctx = ctx("/");
        let err = chain.run(&mut ctx).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "OUTPUT_CONTRACT_VIOLATION");
    }
}
