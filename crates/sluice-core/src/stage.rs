//! Request fields that a route declaration can validate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated (or decoded) part of the request.
///
/// `Type` stands for the body-decoding step; the other variants are the
/// input fields checked against declared schemas, in the fixed order of
/// [`Stage::INPUTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Body decoding against the declared content types.
    Type,
    /// Request headers.
    Header,
    /// Query string parameters.
    Query,
    /// Path parameters.
    Params,
    /// Decoded request body.
    Body,
}

impl Stage {
    /// Input fields in validation order.
    pub const INPUTS: [Stage; 4] = [Stage::Header, Stage::Query, Stage::Params, Stage::Body];

    /// Returns the lowercase field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Header => "header",
            Self::Query => "query",
            Self::Params => "params",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
