//! Exposes the compiled route to later middleware and handlers.

use std::sync::Arc;

use sluice_core::RouteResult;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::route::RouteSnapshot;

/// Attaches the route snapshot to the context.
#[derive(Debug, Clone)]
pub struct ExposeSpec {
    snapshot: Arc<RouteSnapshot>,
}

impl ExposeSpec {
    /// Creates the stage for one route.
    #[must_use]
    pub fn new(snapshot: Arc<RouteSnapshot>) -> Self {
        Self { snapshot }
    }
}

impl Middleware for ExposeSpec {
    fn name(&self) -> &'static str {
        "expose_spec"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            ctx.set_route(Arc::clone(&self.snapshot));
            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_snapshot_exposed_and_isolated() {
        let snapshot = Arc::new(RouteSnapshot {
            path: "/users/:id".into(),
            methods: vec!["get".into()],
            validate: None,
            meta: Some(json!({"summary": "fetch a user"})),
        });
        let stage = ExposeSpec::new(Arc::clone(&snapshot));

        let mut ctx = RequestContext::default();
        stage.process(&mut ctx, Next::end()).await.unwrap();

        let mut copy = RouteSnapshot::clone(ctx.route().unwrap());
        copy.methods.push("post".into());
        assert_eq!(ctx.route().unwrap().methods, vec!["get"]);
        assert_eq!(snapshot.methods, vec!["get"]);
    }
}
