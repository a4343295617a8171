//! Response contract validation.
//!
//! A route may declare one contract per status matcher:
//!
//! ```json
//! { "200": { "body": { "type": "object" } }, "400-499": { "headers": { "required": ["x-error"] } } }
//! ```
//!
//! Matchers are compiled into inclusive status ranges ([`StatusSpec`]), and
//! two rules whose ranges share a status code are rejected at compile time.
//! At request time the first rule matching the response status validates the
//! response; a status no rule covers is itself a contract violation.

mod rule;
mod status;
mod validator;

pub use rule::{OutputRule, ResponseContract};
pub use status::{StatusRange, StatusSpec};
pub use validator::{OutputValidator, UNCOVERED_STATUS};
