//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing the logging subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed, or installation failed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidFilter {
            filter: "sluice=loud".into(),
            reason: "invalid level".into(),
        };
        assert_eq!(err.to_string(), "invalid log filter 'sluice=loud': invalid level");

        let err = TelemetryError::LoggingInit("already set".into());
        assert_eq!(err.to_string(), "failed to initialize logging: already set");
    }
}
