use thiserror::Error;

/// A route path could not be inserted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid route path `{path}`: {reason}")]
pub struct PathError {
    /// The path as given.
    pub path: String,
    /// Why it was rejected.
    pub reason: String,
}

impl PathError {
    pub(crate) fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
