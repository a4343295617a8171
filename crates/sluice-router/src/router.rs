//! Path router combining the segment trie with regex routes.

use http::Method;
use regex::Regex;

use crate::error::PathError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::pattern::PatternRoute;
use crate::RouteMatch;

/// Matches request paths to endpoints.
///
/// Literal routes live in a segment trie and are tried first; regex routes
/// are then scanned in registration order.
///
/// ```rust
/// use sluice_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users/:id", MethodRouter::new().get("getUser")).unwrap();
///
/// let found = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(*found.endpoint, "getUser");
/// assert_eq!(found.params.get("id"), Some("123"));
/// ```
///
/// # Route priority
///
/// 1. static segments (`/users/me`)
/// 2. parameter segments (`/users/:id`)
/// 3. catch-all segments (`/files/*path`)
/// 4. regex routes
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    patterns: Vec<PatternRoute<T>>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            patterns: Vec::new(),
            route_count: 0,
        }
    }

    /// Inserts a literal route path.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), PathError> {
        self.root.insert(path, methods)?;
        self.route_count += 1;
        Ok(())
    }

    /// Inserts a regex route; the same pattern registered twice is merged.
    pub fn insert_pattern(&mut self, regex: Regex, methods: MethodRouter<T>) {
        match self
            .patterns
            .iter_mut()
            .find(|p| p.as_str() == regex.as_str())
        {
            Some(existing) => existing.merge(methods),
            None => self.patterns.push(PatternRoute::new(regex, methods)),
        }
        self.route_count += 1;
    }

    /// Registers one endpoint under a literal path.
    pub fn route(&mut self, method: &Method, path: &str, endpoint: T) -> Result<(), PathError> {
        self.insert(path, MethodRouter::new().method(method, endpoint))
    }

    /// Finds the endpoint for `method` at `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let accept = |m: &MethodRouter<T>| m.endpoint(method).is_some();

        if let Some((methods, params)) = self.root.match_path(path, &accept) {
            let endpoint = methods.endpoint(method)?;
            return Some(RouteMatch::new(endpoint, params));
        }

        self.patterns.iter().find_map(|pattern| {
            let endpoint = pattern.methods().endpoint(method)?;
            let params = pattern.captures(path)?;
            Some(RouteMatch::new(endpoint, params))
        })
    }

    /// Finds the first route at `path`, whatever its methods.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let accept = |m: &MethodRouter<T>| m.has_any_method();

        self.root.match_path(path, &accept).or_else(|| {
            self.patterns.iter().find_map(|pattern| {
                let params = pattern.captures(path)?;
                Some((pattern.methods(), params))
            })
        })
    }

    /// Every method answered at `path`, across all matching routes.
    ///
    /// Empty when no route matches the path.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = Vec::new();
        let mut add = |methods: &MethodRouter<T>| {
            for method in methods.allowed_methods() {
                if !allowed.contains(&method) {
                    allowed.push(method);
                }
            }
        };

        if let Some((methods, _)) = self.match_path(path) {
            add(methods);
        }
        for pattern in &self.patterns {
            if pattern.captures(path).is_some() {
                add(pattern.methods());
            }
        }

        allowed
    }

    /// Number of insertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
