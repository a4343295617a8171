//! Request cookies.

use http::{header, HeaderMap};
use std::collections::HashMap;

/// Cookies sent with a request.
///
/// ```rust
/// use http::{header, HeaderMap, HeaderValue};
/// use sluice_extract::Cookies;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("lang=fr; theme=\"dark\""));
///
/// let cookies = Cookies::from_headers(&headers);
/// assert_eq!(cookies.get("lang"), Some("fr"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    cookies: HashMap<String, String>,
}

impl Cookies {
    /// Parses every `Cookie` header; the first occurrence of a name wins.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            for pair in value.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    let value = value.trim().trim_matches('"');
                    let value = urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    cookies.entry(name.trim().to_string()).or_insert(value);
                }
            }
        }
        Self { cookies }
    }

    /// Returns a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Returns true if no cookies were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_multiple_headers_first_wins() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(header::COOKIE, HeaderValue::from_static("a=9"));

        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("2"));
    }

    #[test]
    fn test_values_are_decoded() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("name=Ada%20L"));
        assert_eq!(Cookies::from_headers(&headers).get("name"), Some("Ada L"));
    }

    #[test]
    fn test_no_cookies() {
        let cookies = Cookies::from_headers(&HeaderMap::new());
        assert!(cookies.is_empty());
        assert_eq!(cookies.get("a"), None);
    }

    #[test]
    fn test_malformed_pairs_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("novalue; ok=yes"));
        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.get("ok"), Some("yes"));
        assert_eq!(cookies.get("novalue"), None);
    }
}
