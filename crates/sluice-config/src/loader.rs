//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sluice_telemetry::LogFormat;

use crate::{ConfigError, SluiceConfig};

/// Loads [`SluiceConfig`] in layers, later layers overriding earlier ones:
///
/// 1. Defaults
/// 2. A TOML or JSON file (or string)
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// ```no_run
/// use sluice_config::ConfigLoader;
///
/// # fn main() -> Result<(), sluice_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("sluice.toml")?
///     .with_dotenv()
///     .with_env_prefix("SLUICE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: SluiceConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SluiceConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SluiceConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file. Unknown fields are errors.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.config = Self::parse(&content, format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`toml` or `json`).
    ///
    /// ```
    /// use sluice_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[router]\ncookie = \"lang\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.router.cookie.as_deref(), Some("lang"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `SLUICE`, `SLUICE__ROUTER__COOKIE=lang` sets
    /// `router.cookie` and `SLUICE__LOGGING__LEVEL=debug` sets `logging.level`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Loads a specific env file into the process environment.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| match e {
            dotenvy::Error::Io(source) => ConfigError::read_error(path, source),
            other => ConfigError::env_parse_error(path.display().to_string(), other.to_string()),
        })?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<SluiceConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SluiceConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<SluiceConfig, ConfigError> {
        match format.to_lowercase().as_str() {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();
        let router = &mut self.config.router;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["ROUTER", "EXTENSIONS"] => {
                router.extensions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["ROUTER", "DIRECTORY"] => router.directory = non_empty(value).map(PathBuf::from),
            ["ROUTER", "DEFAULT_LOCALE"] => router.default_locale = value.to_string(),
            ["ROUTER", "SUFFIX"] => router.suffix = value.to_string(),
            ["ROUTER", "COOKIE"] => router.cookie = non_empty(value).map(str::to_string),
            ["ROUTER", "QUERY_PARAMETER"] => {
                router.query_parameter = non_empty(value).map(str::to_string);
            }
            ["ROUTER", "IGNORE_OUTPUT_VALIDATION"] => {
                router.ignore_output_validation = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {}
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, SluiceConfig::default());
    }

    #[test]
    fn test_development_preset() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_toml_string() {
        let toml = r#"
            [router]
            extensions = ["identifiers"]
            directory = "locales"
            default_locale = "fr"
            cookie = "locale"
            query_parameter = "lang"
            ignore_output_validation = true

            [logging]
            level = "sluice_middleware=debug,info"
            format = "pretty"
        "#;
        let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();

        assert_eq!(config.router.extensions, vec!["identifiers"]);
        assert_eq!(config.router.directory, Some(PathBuf::from("locales")));
        assert_eq!(config.router.default_locale, "fr");
        assert_eq!(config.router.suffix, ".json");
        assert_eq!(config.router.cookie.as_deref(), Some("locale"));
        assert_eq!(config.router.query_parameter.as_deref(), Some("lang"));
        assert!(config.router.ignore_output_validation);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_string() {
        let json = r#"{"router": {"suffix": ".locale.json"}}"#;
        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();
        assert_eq!(config.router.suffix, ".locale.json");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[router]\nlocale_cookie = \"x\"", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("router: {}", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_file_loading() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[router]\nquery_parameter = \"lang\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.router.query_parameter.as_deref(), Some("lang"));
    }

    #[test]
    fn test_missing_files() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/sluice.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/sluice.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, SluiceConfig::default());
    }

    #[test]
    fn test_invalid_values_fail_load() {
        let result = ConfigLoader::new()
            .with_string("[router]\ndefault_locale = \"\"", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    // Process-wide env vars race across tests; exercise the mapping directly.
    #[test]
    fn test_apply_env_var_router() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__ROUTER__EXTENSIONS", "dates, identifiers,", "T").unwrap();
        loader.apply_env_var("T__ROUTER__COOKIE", "locale", "T").unwrap();
        loader.apply_env_var("T__ROUTER__DIRECTORY", "/srv/locales", "T").unwrap();
        loader.apply_env_var("T__ROUTER__IGNORE_OUTPUT_VALIDATION", "yes", "T").unwrap();

        let router = &loader.config.router;
        assert_eq!(router.extensions, vec!["dates", "identifiers"]);
        assert_eq!(router.cookie.as_deref(), Some("locale"));
        assert_eq!(router.directory, Some(PathBuf::from("/srv/locales")));
        assert!(router.ignore_output_validation);
    }

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__LOGGING__FORMAT", "pretty", "T").unwrap();
        loader.apply_env_var("T__LOGGING__LEVEL", "warn", "T").unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.logging.level, "warn");

        let err = loader.apply_env_var("T__LOGGING__ENABLED", "sometimes", "T").unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SLUICE_DOTENV_TEST__ROUTER__COOKIE=from-dotenv").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .with_env_prefix("SLUICE_DOTENV_TEST")
            .load()
            .unwrap();
        assert_eq!(config.router.cookie.as_deref(), Some("from-dotenv"));
    }
}
