//! Path parameters captured by a route match.

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

/// Path parameters in capture order.
///
/// Values are percent-decoded; a value that does not decode to UTF-8 is kept
/// as it appeared in the path.
///
/// ```rust
/// use sluice_router::Params;
///
/// let mut params = Params::new();
/// params.push("user", "ada%20lovelace");
///
/// assert_eq!(params.get("user"), Some("ada lovelace"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw (still percent-encoded) parameter.
    pub fn push(&mut self, name: impl Into<String>, raw: &str) {
        let value = urlencoding::decode(raw)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        self.inner.push((name.into(), value));
    }

    /// Returns the value of the first parameter named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a parameter named `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(n, _)| n == name)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops parameters captured after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); INLINE_PARAMS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_decodes() {
        let mut params = Params::new();
        params.push("name", "caf%C3%A9");
        assert_eq!(params.get("name"), Some("café"));
    }

    #[test]
    fn test_push_keeps_invalid_utf8_raw() {
        let mut params = Params::new();
        params.push("blob", "%FF%FE");
        assert_eq!(params.get("blob"), Some("%FF%FE"));
    }

    #[test]
    fn test_truncate_for_backtracking() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);
        assert_eq!(params.len(), 1);
        assert!(params.contains("a"));
        assert!(!params.contains("b"));
    }

    #[test]
    fn test_into_iter_preserves_order() {
        let mut params = Params::new();
        params.push("org", "acme");
        params.push("id", "7");
        let pairs: Vec<_> = params.into_iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("org".to_string(), "acme".to_string()),
                ("id".to_string(), "7".to_string())
            ]
        );
    }
}
