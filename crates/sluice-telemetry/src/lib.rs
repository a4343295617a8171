//! Structured logging for Sluice.
//!
//! Every Sluice crate logs through [`tracing`]: route compilation at `debug`,
//! captured validation failures at `warn`, output contract violations at
//! `error`. This crate installs the subscriber that renders those events,
//! either as JSON lines or in a human-readable layout.
//!
//! ```rust,ignore
//! use sluice_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(route = "/users/:id", "router ready");
//! ```
//!
//! Log field names shared across crates live in [`fields`].

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
