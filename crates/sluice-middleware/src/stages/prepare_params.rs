//! Copies router path parameters into the request.

use serde_json::{Map, Value};
use sluice_core::RouteResult;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Fills `request.params` from the parameters the router extracted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareParams;

impl Middleware for PrepareParams {
    fn name(&self) -> &'static str {
        "prepare_params"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            let params: Map<String, Value> = ctx
                .route_params()
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            ctx.request.params = params;
            next.run(ctx).await
        })
    }
}
