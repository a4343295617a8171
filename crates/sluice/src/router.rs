//! The router facade.
//!
//! Compiles route declarations, registers each compiled chain under its path
//! and methods, and dispatches requests to them.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use sluice_config::RouterOptions;
use sluice_core::{CompileError, RouteError, SchemaService, SpecError};
use sluice_middleware::{BoxedMiddleware, Chain, Next, RequestContext, Response, ResponseExt};
use sluice_router::{MethodRouter, Router as PathRouter};
use sluice_schema::{ExtensionRegistry, JsonSchemaService, SchemaOptions};
use tracing::{debug, error, warn};

use crate::compile::{compile, CompiledRoute};
use crate::spec::{Handler, MethodSpec, RouteConfig, RoutePath, RouteSpec};

/// Methods registered by [`Router::all`].
const ALL_METHODS: [&str; 9] = [
    "get", "post", "put", "patch", "delete", "head", "options", "trace", "connect",
];

/// Compiles routes and dispatches requests to them.
///
/// ```
/// use serde_json::json;
/// use sluice::{from_fn, Router};
///
/// let mut router = Router::new();
/// router
///     .get("/ping", from_fn("ping", |ctx, next| {
///         Box::pin(async move {
///             ctx.response.set_body(json!({"pong": true}));
///             next.run(ctx).await
///         })
///     }))
///     .unwrap();
/// assert_eq!(router.routes().len(), 1);
/// ```
pub struct Router {
    options: RouterOptions,
    schemas: Arc<dyn SchemaService>,
    prefix: Option<String>,
    middleware: Vec<BoxedMiddleware>,
    params: Vec<(String, BoxedMiddleware)>,
    routes: Vec<CompiledRoute>,
    table: PathRouter<usize>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a router with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Creates a router whose schemas load the configured extensions and
    /// message catalogs.
    ///
    /// Extensions or catalogs that fail to load are logged and skipped.
    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        let schema_options = SchemaOptions {
            extensions: options.extensions.clone(),
            directory: options.directory.clone(),
            default_locale: options.default_locale.clone(),
            suffix: options.suffix.clone(),
        };
        let schemas = JsonSchemaService::from_options(&schema_options, &ExtensionRegistry::with_defaults());
        Self::with_schema_service(options, Arc::new(schemas))
    }

    /// Creates a router backed by a custom schema service.
    #[must_use]
    pub fn with_schema_service(options: RouterOptions, schemas: Arc<dyn SchemaService>) -> Self {
        Self {
            options,
            schemas,
            prefix: None,
            middleware: Vec::new(),
            params: Vec::new(),
            routes: Vec::new(),
            table: PathRouter::new(),
        }
    }

    /// The options every route is compiled with.
    #[must_use]
    pub fn config(&self) -> &RouterOptions {
        &self.options
    }

    /// Mounts every route under `prefix`, e.g. `/api`.
    pub fn prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        self.prefix = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Runs `middleware` before the chain of every matched route.
    pub fn use_middleware(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Runs `middleware` before the chain of matched routes that capture the
    /// path parameter `name`.
    pub fn param(&mut self, name: impl Into<String>, middleware: BoxedMiddleware) -> &mut Self {
        self.params.push((name.into(), middleware));
        self
    }

    /// Compiled routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Compiles and registers one route.
    pub fn route(&mut self, spec: RouteSpec) -> Result<&mut Self, CompileError> {
        self.add_routes([spec])
    }

    /// Compiles and registers several routes.
    ///
    /// Nothing is registered unless every route compiles.
    pub fn add_routes<I>(&mut self, specs: I) -> Result<&mut Self, CompileError>
    where
        I: IntoIterator<Item = RouteSpec>,
    {
        let compiled = specs
            .into_iter()
            .map(|spec| compile(&spec, self.schemas.as_ref(), &self.options))
            .collect::<Result<Vec<_>, _>>()?;

        let mut table = self.table.clone();
        for (offset, route) in compiled.iter().enumerate() {
            register(&mut table, route, self.routes.len() + offset)?;
        }

        self.table = table;
        self.routes.extend(compiled);
        Ok(self)
    }

    /// Registers a route for every method of [`ALL_METHODS`].
    pub fn all(&mut self, path: impl Into<RoutePath>, handler: impl Into<Handler>) -> Result<&mut Self, CompileError> {
        self.route(RouteSpec::new(ALL_METHODS, path, handler))
    }

    /// Same as [`Router::all`], with a validation contract.
    pub fn all_with(
        &mut self,
        path: impl Into<RoutePath>,
        config: impl Into<RouteConfig>,
        handler: impl Into<Handler>,
    ) -> Result<&mut Self, CompileError> {
        self.route(RouteSpec::new(ALL_METHODS, path, handler).with_config(config.into()))
    }

    fn shortcut(
        &mut self,
        method: &str,
        path: RoutePath,
        config: Option<RouteConfig>,
        handler: Handler,
    ) -> Result<&mut Self, CompileError> {
        let mut spec = RouteSpec::new(MethodSpec::from(method), path, handler);
        if let Some(config) = config {
            spec = spec.with_config(config);
        }
        self.route(spec)
    }

    /// Handles a request whose body is already buffered.
    pub async fn handle(&self, request: http::Request<Bytes>) -> Response {
        let method = request.method().clone();
        let full_path = request.uri().path().to_string();

        let Some(path) = self.strip_prefix(&full_path) else {
            return not_found(&method, &full_path);
        };

        let Some(found) = self.table.match_route(&method, path) else {
            let allowed = self.table.allowed_methods(path);
            if allowed.is_empty() {
                return not_found(&method, &full_path);
            }
            return method_not_allowed(&method, &full_path, &allowed);
        };
        let Some(route) = self.routes.get(*found.endpoint) else {
            error!(index = *found.endpoint, "route table points past the compiled routes");
            return Response::from_route_error(&RouteError::internal("route table out of sync"));
        };

        debug!(method = %method, path = %full_path, route = %route.path(), "dispatching");

        let mut prelude = Chain::new(self.middleware.clone());
        for (name, middleware) in &self.params {
            if found.params.contains(name) {
                prelude.push(Arc::clone(middleware));
            }
        }

        let mut ctx = RequestContext::from_request(request);
        ctx.set_route_params(
            found
                .params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        );

        let result = prelude.then(route.chain().then(Next::end())).run(&mut ctx).await;
        match result {
            Ok(()) => ctx.response.into_http(),
            Err(err) => {
                if err.status_code().is_server_error() {
                    error!(request_id = %ctx.request_id(), path = %full_path, error = %err, "request failed");
                } else {
                    debug!(request_id = %ctx.request_id(), path = %full_path, error = %err, "request rejected");
                }
                Response::from_route_error(&err)
            }
        }
    }

    /// Buffers the request body and handles the request.
    pub async fn dispatch(&self, request: http::Request<Full<Bytes>>) -> Response {
        let (parts, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        self.handle(http::Request::from_parts(parts, bytes)).await
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        let Some(prefix) = &self.prefix else {
            return Some(path);
        };
        match path.strip_prefix(prefix.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }
}

macro_rules! method_shortcuts {
    ($($method:ident, $with:ident, $name:literal;)*) => {
        impl Router {
            $(
                #[doc = concat!("Registers a `", $name, "` route.")]
                pub fn $method(
                    &mut self,
                    path: impl Into<RoutePath>,
                    handler: impl Into<Handler>,
                ) -> Result<&mut Self, CompileError> {
                    self.shortcut($name, path.into(), None, handler.into())
                }

                #[doc = concat!("Registers a `", $name, "` route with a validation contract.")]
                pub fn $with(
                    &mut self,
                    path: impl Into<RoutePath>,
                    config: impl Into<RouteConfig>,
                    handler: impl Into<Handler>,
                ) -> Result<&mut Self, CompileError> {
                    self.shortcut($name, path.into(), Some(config.into()), handler.into())
                }
            )*
        }
    };
}

method_shortcuts! {
    get, get_with, "get";
    post, post_with, "post";
    put, put_with, "put";
    patch, patch_with, "patch";
    delete, delete_with, "delete";
    head, head_with, "head";
    options, options_with, "options";
    trace, trace_with, "trace";
    connect, connect_with, "connect";
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

fn register(table: &mut PathRouter<usize>, route: &CompiledRoute, index: usize) -> Result<(), SpecError> {
    let methods = route
        .http_methods()?
        .iter()
        .fold(MethodRouter::new(), |methods, method| methods.method(method, index));

    match route.path() {
        RoutePath::Literal(path) => table
            .insert(path, methods)
            .map_err(|err| SpecError::new("path", err.to_string())),
        RoutePath::Pattern(regex) => {
            table.insert_pattern(regex.clone(), methods);
            Ok(())
        }
    }
}

fn not_found(method: &Method, path: &str) -> Response {
    debug!(method = %method, path = %path, "no route");
    Response::from_route_error(&RouteError::not_found(format!("no route for {method} {path}")))
}

fn method_not_allowed(method: &Method, path: &str, allowed: &[Method]) -> Response {
    warn!(method = %method, path = %path, "method not allowed");
    let err = RouteError::http(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed for {path}"),
    );
    let mut response = Response::from_route_error(&err);
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}
