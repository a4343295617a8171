//! Segment trie.
//!
//! Each node stands for one path segment. Matching prefers static children,
//! then parameter children in registration order, then the catch-all child,
//! and backtracks when a branch fails deeper down.

use crate::error::PathError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment (`users`).
    Static,
    /// Named parameter (`:id` or `{id}`).
    Param(String),
    /// Catch-all (`*rest`), always last.
    Wildcard(String),
}

/// A node in the segment trie.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The segment as written in the route path.
    pub segment: String,
    /// What kind of segment this is.
    pub kind: SegmentKind,
    /// Endpoints, if a route ends here.
    pub methods: Option<MethodRouter<T>>,
    /// Static children, sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    /// Parameter children in registration order.
    param_children: Vec<Node<T>>,
    /// Catch-all child.
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Inserts a route path.
    ///
    /// Registering the same path twice merges the method tables; endpoints
    /// registered first win.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), PathError> {
        let segments = parse_path(path)?;
        self.insert_segments(&segments, methods);
        Ok(())
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter<T>) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        let child = match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children
                            .insert(i, Node::new(segment.clone(), kind.clone()));
                        &mut self.static_children[i]
                    }
                }
            }
            SegmentKind::Param(_) => {
                match self.param_children.iter().position(|c| c.kind == *kind) {
                    Some(i) => &mut self.param_children[i],
                    None => {
                        self.param_children
                            .push(Node::new(segment.clone(), kind.clone()));
                        let last = self.param_children.len() - 1;
                        &mut self.param_children[last]
                    }
                }
            }
            SegmentKind::Wildcard(_) => &mut **self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new(segment.clone(), kind.clone()))),
        };
        child.insert_segments(remaining, methods);
    }

    /// Finds the first route whose method table satisfies `accept`.
    pub fn match_path(
        &self,
        path: &str,
        accept: &dyn Fn(&MethodRouter<T>) -> bool,
    ) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params, accept)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
        accept: &dyn Fn(&MethodRouter<T>) -> bool,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().filter(|m| accept(m));
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params, accept) {
                return Some(found);
            }
        }

        for child in &self.param_children {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), segment);
                if let Some(found) = child.match_segments(remaining, params, accept) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(methods)) = (&child.kind, &child.methods) {
                if accept(methods) {
                    params.push(name.clone(), &segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a route path into typed segments.
pub(crate) fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, PathError> {
    if !path.starts_with('/') {
        return Err(PathError::new(path, "must start with `/`"));
    }

    let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut names: Vec<&str> = Vec::new();

    for (i, s) in raw.iter().enumerate() {
        let kind = if let Some(name) = s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| s.strip_prefix(':'))
        {
            if name.is_empty() {
                return Err(PathError::new(path, "parameter needs a name"));
            }
            if names.contains(&name) {
                return Err(PathError::new(path, format!("duplicate parameter `{name}`")));
            }
            names.push(name);
            SegmentKind::Param(name.to_string())
        } else if let Some(name) = s.strip_prefix('*') {
            if name.is_empty() {
                return Err(PathError::new(path, "catch-all needs a name"));
            }
            if i + 1 != raw.len() {
                return Err(PathError::new(path, "catch-all must be the last segment"));
            }
            SegmentKind::Wildcard(name.to_string())
        } else {
            SegmentKind::Static
        };
        segments.push(((*s).to_string(), kind));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn any<T>(_: &MethodRouter<T>) -> bool {
        true
    }

    #[test]
    fn test_parse_path_kinds() {
        let segments = parse_path("/users/:id/files/*rest").unwrap();
        assert_eq!(segments[0].1, SegmentKind::Static);
        assert_eq!(segments[1].1, SegmentKind::Param("id".to_string()));
        assert_eq!(segments[3].1, SegmentKind::Wildcard("rest".to_string()));

        let braces = parse_path("/users/{id}").unwrap();
        assert_eq!(braces[1].1, SegmentKind::Param("id".to_string()));
    }

    #[test]
    fn test_parse_path_rejects_bad_paths() {
        assert!(parse_path("users").is_err());
        assert!(parse_path("/files/*rest/more").is_err());
        assert!(parse_path("/a/:id/b/:id").is_err());
        assert!(parse_path("/a/:").is_err());
        assert!(parse_path("/a/*").is_err());
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert("/users/me", MethodRouter::new().get("me")).unwrap();
        root.insert("/users/:id", MethodRouter::new().get("one")).unwrap();

        let (methods, params) = root.match_path("/users/me", &any).unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"me"));
        assert!(params.is_empty());

        let (methods, params) = root.match_path("/users/42", &any).unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"one"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_backtracking_discards_failed_params() {
        let mut root = Node::root();
        root.insert("/:org/settings", MethodRouter::new().get("settings"))
            .unwrap();
        root.insert("/:user", MethodRouter::new().get("profile")).unwrap();
        root.insert("/:slug/*rest", MethodRouter::new().get("files"))
            .unwrap();

        let (methods, params) = root.match_path("/acme/docs/readme.md", &any).unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"files"));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("slug"), Some("acme"));
        assert_eq!(params.get("rest"), Some("docs/readme.md"));
        assert_eq!(params.get("org"), None);
    }

    #[test]
    fn test_distinct_param_names_at_same_depth() {
        let mut root = Node::root();
        root.insert("/items/:id", MethodRouter::new().get("item")).unwrap();
        root.insert("/items/:sku/stock", MethodRouter::new().get("stock"))
            .unwrap();

        let (_, params) = root.match_path("/items/abc/stock", &any).unwrap();
        assert_eq!(params.get("sku"), Some("abc"));
        assert_eq!(params.get("id"), None);
    }

    #[test]
    fn test_accept_predicate_skips_branches() {
        let mut root = Node::root();
        root.insert("/users/me", MethodRouter::new().get("me")).unwrap();
        root.insert("/users/:id", MethodRouter::new().delete("remove"))
            .unwrap();

        let wants_delete = |m: &MethodRouter<&str>| m.endpoint(&Method::DELETE).is_some();
        let (methods, params) = root.match_path("/users/me", &wants_delete).unwrap();
        assert_eq!(methods.endpoint(&Method::DELETE), Some(&"remove"));
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_wildcard_needs_a_segment() {
        let mut root = Node::root();
        root.insert("/files/*path", MethodRouter::new().get("serve")).unwrap();

        assert!(root.match_path("/files", &any).is_none());
        let (_, params) = root.match_path("/files/a/b.txt", &any).unwrap();
        assert_eq!(params.get("path"), Some("a/b.txt"));
    }

    #[test]
    fn test_same_path_twice_merges() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("list")).unwrap();
        root.insert("/users", MethodRouter::new().get("shadowed").post("create"))
            .unwrap();

        let (methods, _) = root.match_path("/users", &any).unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"list"));
        assert_eq!(methods.endpoint(&Method::POST), Some(&"create"));
    }

    #[test]
    fn test_root_path() {
        let mut root = Node::root();
        root.insert("/", MethodRouter::new().get("home")).unwrap();
        assert!(root.match_path("/", &any).is_some());
    }
}
