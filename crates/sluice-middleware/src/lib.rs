//! # Sluice Middleware
//!
//! The request pipeline of a compiled Sluice route.
//!
//! Every route runs the same four stages before its handlers:
//!
//! ```text
//! Request → PrepareParams → ExposeSpec → ParseBody → ValidateIo → handlers
//!                                                        ↓
//! Response ←──────────────── output contract ←───────────┘
//! ```
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`PrepareParams`](stages::PrepareParams) | copy router path parameters into `request.params` |
//! | [`ExposeSpec`](stages::ExposeSpec) | attach the [`RouteSnapshot`] |
//! | [`ParseBody`](stages::ParseBody) | decode json, url-encoded, xml or multipart bodies |
//! | [`ValidateIo`](stages::ValidateIo) | validate inputs, then the response against its [`OutputValidator`](output::OutputValidator) |
//!
//! Handlers are ordinary [`Middleware`]; a handler that wants the next
//! handler to run calls `next.run(ctx)`.

#![doc(html_root_url = "https://docs.rs/sluice-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod output;
pub mod route;
pub mod stages;
pub mod types;

pub use context::{RequestContext, RequestData, ResponseBody, ResponseData};
pub use middleware::{from_fn, BoxFuture, BoxedMiddleware, Chain, FnMiddleware, Middleware, Next};
pub use route::{LocaleSource, RouteSnapshot, RouteValidation};
pub use stages::route_chain;
pub use types::{Request, Response, ResponseExt};
