//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sluice_telemetry::{create_env_filter, LogConfig, LogFormat};

use crate::ConfigError;

/// Complete Sluice configuration.
///
/// ```
/// use sluice_config::SluiceConfig;
///
/// let config = SluiceConfig::default();
/// assert_eq!(config.router.default_locale, "en");
/// assert!(!config.router.ignore_output_validation);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SluiceConfig {
    /// Options applied when routes are compiled.
    #[serde(default)]
    pub router: RouterOptions,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Options applied to every route a router compiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterOptions {
    /// Schema extensions to load on top of the defaults.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Directory of localized message catalogs.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Locale used when a request names none.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// File suffix of message catalogs.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Cookie naming the request locale. Wins over the query parameter.
    #[serde(default)]
    pub cookie: Option<String>,

    /// Query parameter naming the request locale.
    #[serde(default)]
    pub query_parameter: Option<String>,

    /// Skip output validation on every route.
    #[serde(default)]
    pub ignore_output_validation: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            directory: None,
            default_locale: default_locale(),
            suffix: default_suffix(),
            cookie: None,
            query_parameter: None,
            ignore_output_validation: false,
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_suffix() -> String {
    ".json".to_string()
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SluiceConfig {
    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let router = &self.router;
        if router.default_locale.trim().is_empty() {
            return Err(ConfigError::invalid_value("router.default_locale", "must not be empty"));
        }
        if !router.suffix.starts_with('.') || router.suffix.len() < 2 {
            return Err(ConfigError::invalid_value(
                "router.suffix",
                format!("expected a file extension such as '.json', got '{}'", router.suffix),
            ));
        }
        for (field, name) in [
            ("router.cookie", &router.cookie),
            ("router.query_parameter", &router.query_parameter),
        ] {
            if name.as_deref().is_some_and(|name| name.trim().is_empty()) {
                return Err(ConfigError::invalid_value(field, "must not be empty when set"));
            }
        }
        if let Some(name) = router.extensions.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "router.extensions",
                format!("invalid extension name '{name}'"),
            ));
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|err| ConfigError::invalid_value("logging.level", err.to_string()))?;
        }
        Ok(())
    }

    /// Development preset: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at info.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// The logging settings in the form `sluice-telemetry` expects.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            span_events: false,
            file_line_info: self.logging.include_location,
            ansi: self.logging.ansi_enabled,
            include_target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SluiceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.router.suffix, ".json");
        assert!(config.router.extensions.is_empty());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_suffix_validation() {
        let mut config = SluiceConfig::default();
        config.router.suffix = "json".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("router.suffix"));
    }

    #[test]
    fn test_empty_locale_source_rejected() {
        let mut config = SluiceConfig::default();
        config.router.cookie = Some(" ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = SluiceConfig::default();
        config.logging.level = "sluice=loud".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        config.logging.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn test_presets_map_to_log_config() {
        let dev = SluiceConfig::development().to_log_config();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(dev.file_line_info);
        assert!(dev.ansi);
        assert_eq!(dev.level, "debug");

        let prod = SluiceConfig::production().to_log_config();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(!prod.ansi);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = serde_json::from_str::<SluiceConfig>(r#"{"router": {"cookies": "lang"}}"#);
        assert!(err.is_err());
    }
}
