//! Routes whose path is a regular expression.

use regex::Regex;

use crate::method_router::MethodRouter;
use crate::params::Params;

/// A regex-matched route.
///
/// Named capture groups become parameters under their name; unnamed groups
/// are numbered from `0` in the order they appear.
#[derive(Debug, Clone)]
pub struct PatternRoute<T> {
    regex: Regex,
    methods: MethodRouter<T>,
}

impl<T> PatternRoute<T> {
    /// Creates a pattern route.
    #[must_use]
    pub fn new(regex: Regex, methods: MethodRouter<T>) -> Self {
        Self { regex, methods }
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// The method table.
    #[must_use]
    pub fn methods(&self) -> &MethodRouter<T> {
        &self.methods
    }

    pub(crate) fn merge(&mut self, methods: MethodRouter<T>) {
        self.methods.merge(methods);
    }

    /// Matches `path`, returning the captured parameters.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::new();
        let mut position = 0usize;

        for (i, name) in self.regex.capture_names().enumerate().skip(1) {
            let key = match name {
                Some(name) => name.to_string(),
                None => {
                    let key = position.to_string();
                    position += 1;
                    key
                }
            };
            if let Some(value) = captures.get(i) {
                params.push(key, value.as_str());
            }
        }

        Some(params)
    }
}
