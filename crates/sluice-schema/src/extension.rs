//! Named bundles of custom string formats.
//!
//! Two extensions are always loaded: `dates` and `identifiers`. Additional
//! names come from configuration; a name that cannot be resolved is logged
//! and skipped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ExtensionError;

/// A format checker.
pub type FormatFn = fn(&str) -> bool;

/// A named set of formats usable as `"format": "<name>"` in schemas.
pub trait SchemaExtension: Send + Sync + fmt::Debug {
    /// Extension name, as written in configuration.
    fn name(&self) -> &str;

    /// Formats contributed by this extension.
    fn formats(&self) -> Vec<(&'static str, FormatFn)>;
}

/// Extensions loaded unconditionally.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["dates", "identifiers"];

/// Date and time formats beyond the JSON Schema built-ins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormats;

impl SchemaExtension for DateFormats {
    fn name(&self) -> &str {
        "dates"
    }

    fn formats(&self) -> Vec<(&'static str, FormatFn)> {
        vec![
            ("rfc2822", |s| chrono::DateTime::parse_from_rfc2822(s).is_ok()),
            ("unix-timestamp", |s| {
                s.parse::<i64>()
                    .ok()
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                    .is_some()
            }),
            ("local-date-time", |s| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
            }),
        ]
    }
}

/// Identifier formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierFormats;

impl SchemaExtension for IdentifierFormats {
    fn name(&self) -> &str {
        "identifiers"
    }

    fn formats(&self) -> Vec<(&'static str, FormatFn)> {
        vec![
            ("uuid-v4", |s| {
                uuid::Uuid::parse_str(s).is_ok_and(|id| id.get_version_num() == 4)
            }),
            ("uuid-v7", |s| {
                uuid::Uuid::parse_str(s).is_ok_and(|id| id.get_version_num() == 7)
            }),
            ("slug", |s| {
                !s.is_empty()
                    && !s.starts_with('-')
                    && !s.ends_with('-')
                    && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            }),
        ]
    }
}

/// Extensions available for loading, by name.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    available: HashMap<String, Arc<dyn SchemaExtension>>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExtensionRegistry {
    /// A registry knowing only the built-in extensions.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            available: HashMap::new(),
        };
        registry.register(DateFormats);
        registry.register(IdentifierFormats);
        registry
    }

    /// Makes an extension available under its name.
    pub fn register(&mut self, extension: impl SchemaExtension + 'static) {
        self.available
            .insert(extension.name().to_string(), Arc::new(extension));
    }

    /// Looks up one extension.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn SchemaExtension>, ExtensionError> {
        self.available
            .get(name)
            .cloned()
            .ok_or_else(|| ExtensionError::Unknown(name.to_string()))
    }

    /// Loads the default extensions plus `requested`, de-duplicated.
    ///
    /// Failures are logged and skipped.
    pub fn load(&self, requested: &[String]) -> LoadedFormats {
        let mut names: Vec<&str> = DEFAULT_EXTENSIONS.to_vec();
        for name in requested {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }

        let mut loaded = LoadedFormats::default();
        for name in names {
            let result = self
                .resolve(name)
                .and_then(|extension| loaded.add(extension.as_ref()));
            match result {
                Ok(()) => {
                    loaded.extensions.push(name.to_string());
                    debug!(extension = name, "schema extension loaded");
                }
                Err(err) => warn!(extension = name, error = %err, "failed to load schema extension"),
            }
        }
        loaded
    }
}

/// Formats gathered from loaded extensions.
#[derive(Debug, Clone, Default)]
pub struct LoadedFormats {
    extensions: Vec<String>,
    formats: Vec<(&'static str, FormatFn)>,
}

impl LoadedFormats {
    fn add(&mut self, extension: &dyn SchemaExtension) -> Result<(), ExtensionError> {
        let formats = extension.formats();
        if let Some((clash, _)) = formats
            .iter()
            .find(|(name, _)| self.formats.iter().any(|(existing, _)| existing == name))
        {
            return Err(ExtensionError::DuplicateFormat {
                extension: extension.name().to_string(),
                format: (*clash).to_string(),
            });
        }
        self.formats.extend(formats);
        Ok(())
    }

    /// Names of the extensions that loaded.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// All formats, in load order.
    #[must_use]
    pub fn formats(&self) -> &[(&'static str, FormatFn)] {
        &self.formats
    }
}
