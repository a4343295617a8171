//! The validation stages every route chain starts with.
//!
//! ```text
//! prepareParams → exposeSpec → parseBody → validateIO → handlers...
//!                                              ↑              ↓
//!                                              └── output ────┘
//! ```
//!
//! 1. [`PrepareParams`] - copy router path parameters into `request.params`
//! 2. [`ExposeSpec`] - attach the compiled route snapshot
//! 3. [`ParseBody`] - decode the body by content type
//! 4. [`ValidateIo`] - validate inputs, run the handlers, validate the output

mod expose_spec;
mod parse_body;
mod prepare_params;
mod validate_io;

pub use expose_spec::ExposeSpec;
pub use parse_body::ParseBody;
pub use prepare_params::PrepareParams;
pub use validate_io::ValidateIo;

use std::sync::Arc;

use crate::middleware::{BoxedMiddleware, Chain};
use crate::route::{LocaleSource, RouteSnapshot, RouteValidation};

/// Builds the chain of a compiled route: the four stages, then `handlers`.
#[must_use]
pub fn route_chain(
    snapshot: Arc<RouteSnapshot>,
    validation: Arc<RouteValidation>,
    locale: LocaleSource,
    handlers: Vec<BoxedMiddleware>,
) -> Chain {
    let mut stages: Vec<BoxedMiddleware> = Vec::with_capacity(handlers.len() + 4);
    stages.push(Arc::new(PrepareParams));
    stages.push(Arc::new(ExposeSpec::new(snapshot)));
    stages.push(Arc::new(ParseBody::new(Arc::clone(&validation))));
    stages.push(Arc::new(ValidateIo::new(validation, locale)));
    stages.extend(handlers);
    Chain::new(stages)
}
