//! Route compilation.
//!
//! [`compile`] validates a [`RouteSpec`], compiles its schemas and output
//! contracts, and builds the route's middleware chain. The declaration is
//! only read; compiling it twice yields two independent routes.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::Value;
use sluice_config::RouterOptions;
use sluice_core::{CompileError, CompiledSchema, SchemaService, SpecError};
use sluice_extract::{ContentKind, DecodeOptions, XmlOptions};
use sluice_middleware::output::OutputValidator;
use sluice_middleware::{
    route_chain, BoxedMiddleware, Chain, LocaleSource, RouteSnapshot, RouteValidation,
};
use tracing::debug;

use crate::spec::{Handler, MethodSpec, RoutePath, RouteSpec, ValidateSpec};

/// A route ready to be registered.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    path: RoutePath,
    methods: Vec<String>,
    snapshot: Arc<RouteSnapshot>,
    validation: Arc<RouteValidation>,
    chain: Chain,
}

impl CompiledRoute {
    /// The declared path.
    #[must_use]
    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    /// Lowercase methods.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// The snapshot exposed to handlers.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<RouteSnapshot> {
        &self.snapshot
    }

    /// The compiled validation rules.
    #[must_use]
    pub fn validation(&self) -> &RouteValidation {
        &self.validation
    }

    /// The middleware chain: validation stages, then handlers.
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub(crate) fn http_methods(&self) -> Result<Vec<Method>, SpecError> {
        self.methods.iter().map(|method| parse_method(method)).collect()
    }
}

/// Compiles a route declaration.
///
/// Fails with a [`SpecError`] naming the offending field, or with a
/// [`sluice_core::ConfigError`] when output contracts are malformed or
/// ambiguous.
pub fn compile(
    spec: &RouteSpec,
    schemas: &dyn SchemaService,
    options: &RouterOptions,
) -> Result<CompiledRoute, CompileError> {
    check_path(&spec.path)?;
    let methods = normalize_methods(&spec.method)?;
    let handlers = flatten_handlers(&spec.handler)?;

    let validation = match &spec.validate {
        Some(validate) => compile_validation(validate, schemas, options)?,
        None => RouteValidation::default(),
    };
    let validate = spec
        .validate
        .as_ref()
        .map(|declared| exposed_validate(declared, &validation))
        .transpose()?;

    let snapshot = Arc::new(RouteSnapshot {
        path: spec.path.as_str().to_string(),
        methods: methods.clone(),
        validate,
        meta: spec.meta.clone(),
    });
    let validation = Arc::new(validation);
    let locale = LocaleSource {
        cookie: options.cookie.clone(),
        query_parameter: options.query_parameter.clone(),
    };
    let chain = route_chain(
        Arc::clone(&snapshot),
        Arc::clone(&validation),
        locale,
        handlers,
    );

    debug!(
        path = %spec.path,
        methods = ?methods,
        stages = chain.len(),
        output = validation.output.is_some(),
        "route compiled"
    );

    Ok(CompiledRoute {
        path: spec.path.clone(),
        methods,
        snapshot,
        validation,
        chain,
    })
}

/// The validation rules as requests see them: `type` lists decoder kinds and
/// `failure` is always present.
fn exposed_validate(declared: &ValidateSpec, validation: &RouteValidation) -> Result<Value, SpecError> {
    let mut value =
        serde_json::to_value(declared).map_err(|err| SpecError::new("validate", err.to_string()))?;
    if let Value::Object(map) = &mut value {
        if !validation.types.is_empty() {
            let kinds: Value = validation.types.iter().map(ContentKind::as_str).collect();
            map.insert("type".into(), kinds);
        }
        map.insert("failure".into(), Value::from(validation.failure.as_u16()));
    }
    Ok(value)
}

fn check_path(path: &RoutePath) -> Result<(), SpecError> {
    match path {
        RoutePath::Literal(path) if path.is_empty() => {
            Err(SpecError::new("path", "must not be empty"))
        }
        RoutePath::Literal(path) if !path.starts_with('/') => Err(SpecError::new(
            "path",
            format!("`{path}` must start with '/'"),
        )),
        _ => Ok(()),
    }
}

fn parse_method(method: &str) -> Result<Method, SpecError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| SpecError::new("method", format!("`{method}` is not a valid HTTP method")))
}

/// Splits, lowercases and checks the declared methods.
pub(crate) fn normalize_methods(spec: &MethodSpec) -> Result<Vec<String>, SpecError> {
    let mut methods: Vec<String> = Vec::new();
    for entry in spec.entries() {
        let method = entry.trim().to_ascii_lowercase();
        if method.is_empty() {
            return Err(SpecError::new("method", "entries must not be empty"));
        }
        parse_method(&method)?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    if methods.is_empty() {
        return Err(SpecError::new("method", "at least one method is required"));
    }
    Ok(methods)
}

fn flatten_handlers(handler: &Handler) -> Result<Vec<BoxedMiddleware>, SpecError> {
    fn walk(handler: &Handler, out: &mut Vec<BoxedMiddleware>) -> Result<(), SpecError> {
        match handler {
            Handler::Middleware(middleware) => out.push(Arc::clone(middleware)),
            Handler::Generator(name) => {
                return Err(SpecError::new(
                    "handler",
                    format!("generator-style handler `{name}` is not supported, use an async middleware"),
                ))
            }
            Handler::Group(handlers) => {
                for handler in handlers {
                    walk(handler, out)?;
                }
            }
        }
        Ok(())
    }

    let mut handlers = Vec::new();
    walk(handler, &mut handlers)?;
    if handlers.is_empty() {
        return Err(SpecError::new("handler", "at least one handler is required"));
    }
    Ok(handlers)
}

fn body_kinds(validate: &ValidateSpec) -> Result<Vec<ContentKind>, SpecError> {
    let Some(declared) = &validate.kind else {
        if validate.body.is_some() {
            return Err(SpecError::new(
                "validate.type",
                "required when validate.body is declared",
            ));
        }
        return Ok(Vec::new());
    };

    let mut kinds = Vec::new();
    for name in declared.as_slice() {
        let kind = ContentKind::from_declared(name).ok_or_else(|| {
            SpecError::new(
                "validate.type",
                format!("unsupported body type `{name}`, expected json, form, xml, multipart or stream"),
            )
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(SpecError::new("validate.type", "at least one body type is required"));
    }
    Ok(kinds)
}

fn compile_schema(
    schemas: &dyn SchemaService,
    field: &str,
    definition: Option<&Value>,
) -> Result<Option<Arc<dyn CompiledSchema>>, SpecError> {
    definition
        .map(|definition| {
            schemas
                .compile(definition)
                .map_err(|err| SpecError::new(format!("validate.{field}"), err.to_string()))
        })
        .transpose()
}

fn compile_validation(
    validate: &ValidateSpec,
    schemas: &dyn SchemaService,
    options: &RouterOptions,
) -> Result<RouteValidation, CompileError> {
    let types = body_kinds(validate)?;

    let failure = match validate.failure {
        None => StatusCode::BAD_REQUEST,
        Some(code) => StatusCode::from_u16(code)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .ok_or_else(|| {
                SpecError::new("validate.failure", format!("{code} is not a 4xx or 5xx status"))
            })?,
    };

    let output = match &validate.output {
        Some(output) if output.ignore || options.ignore_output_validation => None,
        Some(output) if output.rules.is_empty() => {
            return Err(SpecError::new(
                "validate.output",
                "declare at least one status contract or set ignore",
            )
            .into())
        }
        Some(output) => Some(OutputValidator::compile(
            schemas,
            output.rules.iter().map(|(status, contract)| (status.as_str(), contract)),
        )?),
        None => None,
    };

    Ok(RouteValidation {
        header: compile_schema(schemas, "header", validate.header.as_ref())?,
        query: compile_schema(schemas, "query", validate.query.as_ref())?,
        params: compile_schema(schemas, "params", validate.params.as_ref())?,
        body: compile_schema(schemas, "body", validate.body.as_ref())?,
        types,
        decode: DecodeOptions {
            limit: validate.max_body,
            xml: XmlOptions {
                explicit_array: validate.xml_array.unwrap_or(false),
                explicit_root: validate.xml_root.unwrap_or(false),
            },
            multipart: validate.multipart_options.clone().unwrap_or_default(),
        },
        failure,
        continue_on_error: validate.continue_on_error,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::ConfigError;
    use sluice_middleware::from_fn;
    use sluice_schema::JsonSchemaService;

    fn ok() -> BoxedMiddleware {
        from_fn("ok", |ctx, next| Box::pin(async move { next.run(ctx).await }))
    }

    fn validate(value: Value) -> ValidateSpec {
        serde_json::from_value(value).unwrap()
    }

    fn compile_spec(spec: &RouteSpec) -> Result<CompiledRoute, CompileError> {
        compile(spec, &JsonSchemaService::default(), &RouterOptions::default())
    }

    fn spec_error(spec: &RouteSpec) -> SpecError {
        match compile_spec(spec).unwrap_err() {
            CompileError::Spec(err) => err,
            other => panic!("expected a spec error, got {other:?}"),
        }
    }

    #[test]
    fn test_methods_normalized() {
        assert_eq!(normalize_methods(&"get post".into()).unwrap(), vec!["get", "post"]);
        assert_eq!(normalize_methods(&["PUT", "put", "Patch"].into()).unwrap(), vec!["put", "patch"]);
        assert_eq!(normalize_methods(&"PROPFIND".into()).unwrap(), vec!["propfind"]);
    }

    #[test]
    fn test_invalid_methods() {
        let err = normalize_methods(&Vec::<String>::new().into()).unwrap_err();
        assert_eq!(err.field, "method");

        assert!(normalize_methods(&"   ".into()).is_err());
        assert!(normalize_methods(&["get", ""].into()).is_err());
        assert!(normalize_methods(&["get{}"].into()).is_err());
    }

    #[test]
    fn test_chain_layout() {
        let spec = RouteSpec::new("get", "/items", vec![ok(), ok()]);
        let route = compile_spec(&spec).unwrap();
        assert_eq!(
            route.chain().stage_names(),
            vec!["prepare_params", "expose_spec", "parse_body", "validate_io", "ok", "ok"]
        );
        assert_eq!(route.validation().failure, StatusCode::BAD_REQUEST);
        assert!(route.validation().types.is_empty());
    }

    #[test]
    fn test_nested_handlers_flattened() {
        let nested = Handler::from(vec![
            Handler::from(ok()),
            Handler::from(vec![Handler::from(ok()), Handler::from(vec![Handler::from(ok())])]),
        ]);
        let route = compile_spec(&RouteSpec::new("get", "/", nested)).unwrap();
        assert_eq!(route.chain().len(), 7);
    }

    #[test]
    fn test_handler_errors() {
        let empty = RouteSpec::new("get", "/", Handler::Group(Vec::new()));
        assert_eq!(spec_error(&empty).field, "handler");

        let generator = RouteSpec::new("get", "/", vec![Handler::from(ok()), Handler::generator("legacy")]);
        let err = spec_error(&generator);
        assert_eq!(err.field, "handler");
        assert!(err.reason.contains("legacy"));
    }

    #[test]
    fn test_path_errors() {
        assert_eq!(spec_error(&RouteSpec::new("get", "", ok())).field, "path");
        assert_eq!(spec_error(&RouteSpec::new("get", "items", ok())).field, "path");
    }

    #[test]
    fn test_body_requires_type() {
        let spec = RouteSpec::new("post", "/items", ok())
            .with_validate(validate(json!({"body": {"type": "object"}})));
        let err = spec_error(&spec);
        assert_eq!(err.field, "validate.type");
    }

    #[test]
    fn test_types_mapped_to_decoders() {
        let spec = RouteSpec::new("post", "/items", ok())
            .with_validate(validate(json!({"type": ["JSON", "form", "multipart", "stream", "xml"]})));
        let route = compile_spec(&spec).unwrap();
        assert_eq!(
            route.validation().types,
            vec![ContentKind::Json, ContentKind::UrlEncoded, ContentKind::Multipart, ContentKind::Xml]
        );

        let spec = RouteSpec::new("post", "/items", ok())
            .with_validate(validate(json!({"type": "yaml"})));
        assert_eq!(spec_error(&spec).field, "validate.type");
    }

    #[test]
    fn test_decode_options() {
        let spec = RouteSpec::new("post", "/items", ok()).with_validate(validate(json!({
            "type": "xml",
            "maxBody": "2kb",
            "xmlRoot": true,
            "multipartOptions": {"maxFieldSize": 10}
        })));
        let route = compile_spec(&spec).unwrap();
        let decode = &route.validation().decode;
        assert_eq!(decode.limit.unwrap().bytes(), 2048);
        assert!(decode.xml.explicit_root);
        assert!(!decode.xml.explicit_array);
        assert_eq!(decode.multipart.max_field_size, 10);
    }

    #[test]
    fn test_invalid_schema_names_field() {
        let spec = RouteSpec::new("get", "/items", ok())
            .with_validate(validate(json!({"query": {"type": "not-a-type"}})));
        assert_eq!(spec_error(&spec).field, "validate.query");
    }

    #[test]
    fn test_failure_status() {
        let spec = RouteSpec::new("get", "/", ok()).with_validate(validate(json!({"failure": 422})));
        assert_eq!(compile_spec(&spec).unwrap().validation().failure, StatusCode::UNPROCESSABLE_ENTITY);

        let spec = RouteSpec::new("get", "/", ok()).with_validate(validate(json!({"failure": 200})));
        assert_eq!(spec_error(&spec).field, "validate.failure");
    }

    #[test]
    fn test_overlapping_output_rejected() {
        let spec = RouteSpec::new("get", "/", ok()).with_validate(validate(json!({
            "output": {"200": {}, "200,201": {}}
        })));
        assert!(matches!(
            compile_spec(&spec).unwrap_err(),
            CompileError::Config(ConfigError::OverlappingOutputRules { .. })
        ));
    }

    #[test]
    fn test_output_ignored() {
        let declared = validate(json!({"output": {"200": {"body": {"type": "object"}}}}));

        let route = compile_spec(&RouteSpec::new("get", "/", ok()).with_validate(declared.clone())).unwrap();
        assert_eq!(route.validation().output.as_ref().unwrap().rules().len(), 1);

        let options = RouterOptions {
            ignore_output_validation: true,
            ..RouterOptions::default()
        };
        let route = compile(
            &RouteSpec::new("get", "/", ok()).with_validate(declared),
            &JsonSchemaService::default(),
            &options,
        )
        .unwrap();
        assert!(route.validation().output.is_none());

        let ignored = validate(json!({"output": {"ignore": true, "200": {}}}));
        let route = compile_spec(&RouteSpec::new("get", "/", ok()).with_validate(ignored)).unwrap();
        assert!(route.validation().output.is_none());

        let empty = validate(json!({"output": {}}));
        assert_eq!(
            spec_error(&RouteSpec::new("get", "/", ok()).with_validate(empty)).field,
            "validate.output"
        );
    }

    #[test]
    fn test_compilation_is_pure() {
        let spec = RouteSpec::new("GET post", "/users/:id", ok())
            .with_validate(validate(json!({"query": {"type": "object"}})))
            .with_meta(json!({"summary": "user"}));

        let first = compile_spec(&spec).unwrap();
        let second = compile_spec(&spec).unwrap();
        assert!(!Arc::ptr_eq(first.snapshot(), second.snapshot()));
        assert_eq!(first.snapshot(), second.snapshot());

        let mut copy = RouteSnapshot::clone(first.snapshot());
        copy.methods.push("delete".into());
        copy.meta = None;

        assert_eq!(first.snapshot().methods, vec!["get", "post"]);
        assert_eq!(second.snapshot().meta, Some(json!({"summary": "user"})));
        assert_eq!(spec.method, MethodSpec::from("GET post"));
        assert_eq!(
            first.snapshot().validate,
            Some(json!({"query": {"type": "object"}, "failure": 400}))
        );
    }

    #[test]
    fn test_exposed_validate_is_normalized() {
        let spec = RouteSpec::new("post", "/users", ok()).with_validate(validate(json!({
            "type": "form",
            "body": {"type": "object"}
        })));
        let route = compile_spec(&spec).unwrap();
        let exposed = route.snapshot().validate.as_ref().unwrap();
        assert_eq!(exposed["type"], json!(["urlencoded"]));
        assert_eq!(exposed["failure"], json!(400));
        assert_eq!(exposed["body"], json!({"type": "object"}));

        let spec = RouteSpec::new("post", "/users", ok()).with_validate(validate(json!({
            "type": ["json", "multipart"],
            "failure": 422
        })));
        let route = compile_spec(&spec).unwrap();
        let exposed = route.snapshot().validate.as_ref().unwrap();
        assert_eq!(exposed["type"], json!(["json", "multipart/*"]));
        assert_eq!(exposed["failure"], json!(422));
        assert_eq!(route.snapshot().methods, vec!["post"]);
    }

    #[test]
    fn test_pattern_path_snapshot() {
        let spec = RouteSpec::new("get", regex::Regex::new(r"^/v(?P<n>\d+)$").unwrap(), ok());
        let route = compile_spec(&spec).unwrap();
        assert_eq!(route.snapshot().path, r"^/v(?P<n>\d+)$");
        assert_eq!(route.http_methods().unwrap(), vec![Method::GET]);
    }
}
