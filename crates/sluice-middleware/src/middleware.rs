//! Core middleware trait and chain types.
//!
//! Every step of a route, from body parsing to the user's handlers, is a
//! [`Middleware`]. A middleware receives the mutable [`RequestContext`] and a
//! [`Next`] that runs the rest of the chain. Work done before `next.run()`
//! sees the request; work done after it sees the response.
//!
//! # Example
//!
//! ```
//! use sluice_middleware::{BoxFuture, Middleware, Next, RequestContext};
//! use sluice_core::RouteResult;
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, RouteResult<()>> {
//!         Box::pin(async move {
//!             let started = std::time::Instant::now();
//!             let result = next.run(ctx).await;
//!             tracing::debug!(elapsed = ?started.elapsed(), "request handled");
//!             result
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sluice_core::RouteResult;

use crate::context::RequestContext;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A step of a route chain.
///
/// A middleware either calls `next.run(ctx)` once to continue, or returns
/// without calling it to end the chain. Errors propagate back up through every
/// middleware that is still awaiting its `next`.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>>;
}

/// The remainder of a chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    End,
}

impl<'a> Next<'a> {
    /// A `Next` that runs `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// The end of a chain; running it does nothing.
    #[must_use]
    pub const fn end() -> Self {
        Self {
            inner: NextInner::End,
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ctx: &mut RequestContext) -> RouteResult<()> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, *next).await,
            NextInner::End => Ok(()),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::End => f.write_str("Next(end)"),
        }
    }
}

/// An ordered list of middleware.
#[derive(Clone, Default)]
pub struct Chain {
    stages: Vec<BoxedMiddleware>,
}

impl Chain {
    /// Creates a chain from its stages.
    #[must_use]
    pub fn new(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// Appends a stage.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Stage names, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Builds the `Next` that runs every stage, then `tail`.
    pub fn then<'a>(&'a self, tail: Next<'a>) -> Next<'a> {
        self.stages
            .iter()
            .rev()
            .fold(tail, |next, middleware| Next::new(middleware.as_ref(), next))
    }

    /// Runs every stage.
    pub async fn run(&self, ctx: &mut RequestContext) -> RouteResult<()> {
        self.then(Next::end()).run(ctx).await
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// A middleware built from a closure.
///
/// ```
/// use sluice_middleware::FnMiddleware;
///
/// let greet = FnMiddleware::new("greet", |ctx, next| {
///     Box::pin(async move {
///         ctx.response.set_body(serde_json::json!({"hello": "world"}));
///         next.run(ctx).await
///     })
/// });
/// # let _ = greet;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps `func` as a middleware.
    pub const fn new(name: &'static str, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>>
            + Send
            + Sync
            + 'static,
    {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        (self.func)(ctx, next)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}

/// Wraps a closure as a shareable middleware.
pub fn from_fn<F>(name: &'static str, func: F) -> BoxedMiddleware
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnMiddleware::new(name, func))
}
