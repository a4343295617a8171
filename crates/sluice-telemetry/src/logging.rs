//! Subscriber setup and shared log field names.
//!
//! # Example
//!
//! ```rust,ignore
//! use sluice_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::debug!(path = "/orders", methods = "post", "route compiled");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output layout of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether a subscriber is installed at all.
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info` or `sluice_middleware=debug,info`.
    pub level: String,

    /// Output layout.
    pub format: LogFormat,

    /// Emit span open/close events.
    pub span_events: bool,

    /// Include source file and line.
    pub file_line_info: bool,

    /// Include ANSI colors.
    pub ansi: bool,

    /// Include the event target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            ansi: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ansi: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when logging is disabled. Fails if the level directive does
/// not parse or a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target)
        .with_ansi(config.ansi);

    let layer = match config.format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Field names used in log events across Sluice crates.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// Route path pattern.
    pub const ROUTE: &str = "route";

    /// Validation stage (`header`, `query`, `params`, `body`, `type`).
    pub const STAGE: &str = "stage";

    /// Negotiated body kind.
    pub const KIND: &str = "kind";

    /// Response status code.
    pub const STATUS: &str = "status";

    /// Error message.
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = LogConfig::default();
        assert!(default.enabled);
        assert_eq!(default.format, LogFormat::Json);
        assert_eq!(default.level, "info");

        let dev = LogConfig::development();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(dev.span_events);
        assert_eq!(dev.level, "debug");

        assert_eq!(LogConfig::production(), LogConfig::default());
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("sluice_middleware=debug,warn").is_ok());

        let err = create_env_filter("sluice=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
