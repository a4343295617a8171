//! Path matching for Sluice.
//!
//! Routes are stored in a segment trie keyed by path segment, with regex
//! routes scanned after the trie. Each route holds a [`MethodRouter`] mapping
//! HTTP methods to an endpoint of any type `T`; the Sluice facade stores
//! indices of compiled route chains.
//!
//! # Path syntax
//!
//! - literal segments: `/users`
//! - parameters: `/users/:id` or `/users/{id}`
//! - catch-all, last segment only: `/files/*path`
//! - regular expressions via [`Router::insert_pattern`]
//!
//! ```rust
//! use sluice_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users", MethodRouter::new().get("list").post("create")).unwrap();
//! router.insert("/files/*path", MethodRouter::new().get("serve")).unwrap();
//!
//! let found = router.match_route(&Method::GET, "/files/img/logo.png").unwrap();
//! assert_eq!(*found.endpoint, "serve");
//! assert_eq!(found.params.get("path"), Some("img/logo.png"));
//! ```
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!      (leaf)      ":id"
//!   [GET,POST]       │
//!                 (leaf)
//! ```

mod error;
mod method_router;
mod node;
mod params;
mod pattern;
mod router;

pub use error::PathError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use pattern::PatternRoute;
pub use router::Router;

/// A matched endpoint with its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The endpoint registered for the method.
    pub endpoint: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(endpoint: &'a T, params: Params) -> Self {
        Self { endpoint, params }
    }
}
