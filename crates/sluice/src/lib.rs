//! # Sluice
//!
//! Declarative HTTP routes compiled into validated middleware chains.
//!
//! A route is declared as data: a path, its methods, its handlers and an
//! optional validation contract for headers, query, path parameters, body and
//! responses. [`Router`] compiles each declaration once, up front, into a
//! chain every matching request runs through:
//!
//! ```text
//! prepare_params → expose_spec → parse_body → validate_io → handlers...
//!                                                  ↑             ↓
//!                                                  └── output ───┘
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use serde_json::json;
//! use sluice::{from_fn, Router, ValidateSpec};
//!
//! # async fn run() -> Result<(), sluice::CompileError> {
//! let validate: ValidateSpec = serde_json::from_value(json!({
//!     "params": {"type": "object", "properties": {"id": {"type": "integer"}}},
//!     "output": {"200": {"body": {"type": "object", "required": ["id"]}}}
//! }))
//! .unwrap();
//!
//! let mut router = Router::new();
//! router.prefix("/api");
//! router.get_with("/users/:id", validate, from_fn("show_user", |ctx, next| {
//!     Box::pin(async move {
//!         let id = ctx.request.params["id"].clone();
//!         ctx.response.set_body(json!({"id": id}));
//!         next.run(ctx).await
//!     })
//! }))?;
//!
//! let request = http::Request::get("/api/users/7").body(bytes::Bytes::new()).unwrap();
//! let response = router.handle(request).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Module | Crate | Contents |
//! |--------|-------|----------|
//! | [`core`] | `sluice-core` | errors, schema service traits |
//! | [`path_router`] | `sluice-router` | path matching |
//! | [`extract`] | `sluice-extract` | body decoders, content negotiation |
//! | [`schema`] | `sluice-schema` | JSON Schema service, formats, messages |
//! | [`middleware`] | `sluice-middleware` | middleware chain, stages, output contracts |
//! | [`config`] | `sluice-config` | layered configuration |

#![doc(html_root_url = "https://docs.rs/sluice/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compile;
mod router;
mod spec;

pub use compile::{compile, CompiledRoute};
pub use router::Router;
pub use spec::{Handler, MethodSpec, OneOrMany, OutputSpec, RouteConfig, RoutePath, RouteSpec, ValidateSpec};

pub use sluice_config as config;
pub use sluice_core as core;
pub use sluice_extract as extract;
pub use sluice_middleware as middleware;
pub use sluice_router as path_router;
pub use sluice_schema as schema;

pub use sluice_config::RouterOptions;
pub use sluice_core::{CompileError, ConfigError, RouteError, SpecError};
pub use sluice_middleware::{
    from_fn, BoxFuture, BoxedMiddleware, Middleware, Next, RequestContext, Response,
};

/// Common imports.
///
/// ```rust
/// use sluice::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        from_fn, BoxFuture, BoxedMiddleware, CompileError, Handler, Middleware, Next,
        RequestContext, RouteError, RouteSpec, Router, RouterOptions, ValidateSpec,
    };
    pub use sluice_core::RouteResult;
}
