//! Errors captured on a request when a route continues on error.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::error::{Issue, RouteError};
use crate::Stage;

/// An error recorded instead of aborting the request.
///
/// Serializes with the message under `msg`:
///
/// ```json
/// { "msg": "\"abc\" is not of type \"integer\"", "status": 400, "issues": [ ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedError {
    /// Error message.
    pub msg: String,
    /// Status the request would have failed with.
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Individual schema violations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl From<&RouteError> for CapturedError {
    fn from(err: &RouteError) -> Self {
        let issues = match err {
            RouteError::Validation(v) => v.issues.clone(),
            RouteError::OutputContract { issues, .. } => issues.clone(),
            _ => Vec::new(),
        };
        Self {
            msg: err.to_string(),
            status: err.status_code(),
            issues,
        }
    }
}

/// Per-request map of captured errors, keyed by stage.
///
/// Created on the first capture; a later capture for the same stage replaces
/// the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvalidInputs {
    errors: BTreeMap<Stage, CapturedError>,
}

impl InvalidInputs {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for a stage.
    pub fn capture(&mut self, stage: Stage, err: &RouteError) {
        self.errors.insert(stage, CapturedError::from(err));
    }

    /// Returns the error captured for a stage.
    #[must_use]
    pub fn get(&self, stage: Stage) -> Option<&CapturedError> {
        self.errors.get(&stage)
    }

    /// Returns `true` if an error was captured for the stage.
    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        self.errors.contains_key(&stage)
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of captured errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over captured errors in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &CapturedError)> {
        self.errors.iter().map(|(stage, err)| (*stage, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn test_capture_and_serialize() {
        let err = RouteError::from(ValidationError {
            stage: Stage::Query,
            status: StatusCode::BAD_REQUEST,
            message: "\"abc\" is not of type \"integer\"".to_string(),
            issues: vec![Issue::new("/id", "\"abc\" is not of type \"integer\"")],
        });

        let mut invalid = InvalidInputs::new();
        invalid.capture(Stage::Query, &err);

        assert!(invalid.contains(Stage::Query));
        assert!(!invalid.contains(Stage::Body));

        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["query"]["msg"], "\"abc\" is not of type \"integer\"");
        assert_eq!(json["query"]["status"], 400);
        assert_eq!(json["query"]["issues"][0]["path"], "/id");
    }

    #[test]
    fn test_decode_capture_has_no_issues() {
        let err = RouteError::decode(StatusCode::BAD_REQUEST, "expected json but no match");
        let mut invalid = InvalidInputs::new();
        invalid.capture(Stage::Type, &err);

        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["type"]["msg"], "expected json but no match");
        assert!(json["type"].get("issues").is_none());
    }

    #[test]
    fn test_iter_in_stage_order() {
        let mut invalid = InvalidInputs::new();
        invalid.capture(Stage::Body, &RouteError::decode(StatusCode::BAD_REQUEST, "b"));
        invalid.capture(Stage::Header, &RouteError::decode(StatusCode::BAD_REQUEST, "h"));

        let stages: Vec<_> = invalid.iter().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![Stage::Header, Stage::Body]);
        assert_eq!(invalid.len(), 2);
    }
}
