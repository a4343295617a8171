//! Localized validation messages.
//!
//! A catalog directory holds one JSON file per locale, named
//! `{locale}{suffix}` (for example `fr.json`). Each file maps a schema
//! keyword to a message template:
//!
//! ```json
//! { "type": "{path} a un type invalide", "required": "{property} est obligatoire" }
//! ```
//!
//! Templates may use `{path}`, `{value}`, `{keyword}` and `{message}` (the
//! library's own wording). `required` templates also get `{property}`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;

/// Message templates per locale.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    default_locale: String,
    messages: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            messages: HashMap::new(),
        }
    }

    /// Loads every `*{suffix}` file of `directory`.
    pub fn load(
        directory: impl AsRef<Path>,
        suffix: &str,
        default_locale: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let directory = directory.as_ref();
        let mut catalog = Self::new(default_locale);

        let entries = fs::read_dir(directory).map_err(|source| CatalogError::Io {
            path: directory.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let path: PathBuf = entry
                .map_err(|source| CatalogError::Io {
                    path: directory.to_path_buf(),
                    source,
                })?
                .path();
            let Some(locale) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(suffix))
                .filter(|locale| !locale.is_empty())
                .map(str::to_string)
            else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let templates: HashMap<String, String> =
                serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;

            debug!(locale = %locale, templates = templates.len(), "message catalog loaded");
            catalog.insert(locale, templates);
        }

        Ok(catalog)
    }

    /// Adds or replaces the templates of a locale.
    pub fn insert(&mut self, locale: impl Into<String>, templates: HashMap<String, String>) {
        self.messages.insert(locale.into(), templates);
    }

    /// The fallback locale.
    #[must_use]
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Locales with templates.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Finds the template for `keyword`.
    ///
    /// Tries the exact locale, then its language (`fr` for `fr-CA`), then the
    /// default locale.
    #[must_use]
    pub fn template(&self, locale: Option<&str>, keyword: &str) -> Option<&str> {
        let mut candidates: Vec<&str> = Vec::with_capacity(3);
        if let Some(locale) = locale {
            candidates.push(locale);
            if let Some((language, _)) = locale.split_once(['-', '_']) {
                candidates.push(language);
            }
        }
        candidates.push(&self.default_locale);

        candidates.into_iter().find_map(|candidate| {
            self.messages
                .get(candidate)
                .and_then(|templates| templates.get(keyword))
                .map(String::as_str)
        })
    }

    /// Renders the template for `keyword`, if any.
    #[must_use]
    pub fn render(&self, locale: Option<&str>, keyword: &str, vars: &[(&str, String)]) -> Option<String> {
        let template = self.template(locale, keyword)?;
        let mut message = template.to_string();
        for (name, value) in vars {
            message = message.replace(&format!("{{{name}}}"), value);
        }
        Some(message)
    }
}
