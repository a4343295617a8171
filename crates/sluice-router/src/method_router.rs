//! Per-path method table.

use http::Method;

/// Maps HTTP methods to endpoints for a single path.
///
/// `HEAD` falls back to the `GET` endpoint when no `HEAD` endpoint is
/// registered.
///
/// ```rust
/// use sluice_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new().get(1).post(2);
///
/// assert_eq!(router.endpoint(&Method::GET), Some(&1));
/// assert_eq!(router.endpoint(&Method::HEAD), Some(&1));
/// assert_eq!(router.endpoint(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<T>,
    post: Option<T>,
    put: Option<T>,
    delete: Option<T>,
    patch: Option<T>,
    head: Option<T>,
    options: Option<T>,
    trace: Option<T>,
    connect: Option<T>,
    /// Extension methods (anything outside the nine standard ones).
    other: Vec<(Method, T)>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
            trace: None,
            connect: None,
            other: Vec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET endpoint.
    pub fn get(self, endpoint: T) -> Self {
        self.method(&Method::GET, endpoint)
    }

    /// Registers a POST endpoint.
    pub fn post(self, endpoint: T) -> Self {
        self.method(&Method::POST, endpoint)
    }

    /// Registers a PUT endpoint.
    pub fn put(self, endpoint: T) -> Self {
        self.method(&Method::PUT, endpoint)
    }

    /// Registers a DELETE endpoint.
    pub fn delete(self, endpoint: T) -> Self {
        self.method(&Method::DELETE, endpoint)
    }

    /// Registers a PATCH endpoint.
    pub fn patch(self, endpoint: T) -> Self {
        self.method(&Method::PATCH, endpoint)
    }

    /// Registers an endpoint for an arbitrary method.
    pub fn method(mut self, method: &Method, endpoint: T) -> Self {
        match self.standard_slot_mut(method) {
            Some(slot) => *slot = Some(endpoint),
            None => self.insert_other(method, endpoint),
        }
        self
    }

    fn standard_slot_mut(&mut self, method: &Method) -> Option<&mut Option<T>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            Method::TRACE => Some(&mut self.trace),
            Method::CONNECT => Some(&mut self.connect),
            _ => None,
        }
    }

    fn insert_other(&mut self, method: &Method, endpoint: T) {
        match self.other.iter_mut().find(|(m, _)| m == method) {
            Some(slot) => slot.1 = endpoint,
            None => self.other.push((method.clone(), endpoint)),
        }
    }

    fn slot(&self, method: &Method) -> Option<&T> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            Method::CONNECT => self.connect.as_ref(),
            _ => self
                .other
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, endpoint)| endpoint),
        }
    }

    /// Returns the endpoint for `method`.
    #[must_use]
    pub fn endpoint(&self, method: &Method) -> Option<&T> {
        match self.slot(method) {
            Some(endpoint) => Some(endpoint),
            None if *method == Method::HEAD => self.get.as_ref(),
            None => None,
        }
    }

    /// Merges another table into this one.
    ///
    /// Methods already registered here are kept.
    pub fn merge(&mut self, other: MethodRouter<T>) {
        let MethodRouter {
            get,
            post,
            put,
            delete,
            patch,
            head,
            options,
            trace,
            connect,
            other,
        } = other;

        fill(&mut self.get, get);
        fill(&mut self.post, post);
        fill(&mut self.put, put);
        fill(&mut self.delete, delete);
        fill(&mut self.patch, patch);
        fill(&mut self.head, head);
        fill(&mut self.options, options);
        fill(&mut self.trace, trace);
        fill(&mut self.connect, connect);

        for (method, endpoint) in other {
            if !self.other.iter().any(|(m, _)| *m == method) {
                self.other.push((method, endpoint));
            }
        }
    }

    /// Returns true if any method is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.allowed_methods().is_empty()
    }

    /// Lists the methods this path answers, including the implicit `HEAD`.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let standard = [
            (Method::GET, self.get.is_some()),
            (Method::HEAD, self.head.is_some() || self.get.is_some()),
            (Method::POST, self.post.is_some()),
            (Method::PUT, self.put.is_some()),
            (Method::DELETE, self.delete.is_some()),
            (Method::PATCH, self.patch.is_some()),
            (Method::OPTIONS, self.options.is_some()),
            (Method::TRACE, self.trace.is_some()),
            (Method::CONNECT, self.connect.is_some()),
        ];

        standard
            .into_iter()
            .filter_map(|(method, present)| present.then_some(method))
            .chain(self.other.iter().map(|(m, _)| m.clone()))
            .collect()
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}
