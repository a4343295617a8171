//! Typed configuration for Sluice routers.
//!
//! [`SluiceConfig`] holds the options every compiled route shares
//! ([`RouterOptions`]) and the logging setup ([`LoggingSection`]). It is
//! loaded in layers by [`ConfigLoader`]: defaults, then a TOML or JSON file,
//! then `PREFIX__SECTION__KEY` environment variables. Unknown fields are
//! rejected.
//!
//! # File format
//!
//! ```toml
//! [router]
//! extensions = ["identifiers"]
//! directory = "locales"
//! default_locale = "en"
//! suffix = ".json"
//! cookie = "locale"
//! query_parameter = "lang"
//! ignore_output_validation = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment overrides
//!
//! - `SLUICE__ROUTER__EXTENSIONS=dates,identifiers`
//! - `SLUICE__ROUTER__IGNORE_OUTPUT_VALIDATION=true`
//! - `SLUICE__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{LoggingSection, RouterOptions, SluiceConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use sluice_telemetry::LogFormat;
