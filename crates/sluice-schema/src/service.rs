//! [`SchemaService`] backed by the `jsonschema` crate.

use std::fmt;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use sluice_core::{CompiledSchema, Issue, SchemaError, SchemaService, SchemaViolation};
use tracing::{debug, warn};

use crate::catalog::MessageCatalog;
use crate::coerce::coerce;
use crate::extension::{ExtensionRegistry, LoadedFormats};

/// Settings for building a [`JsonSchemaService`].
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    /// Extensions to load on top of the defaults.
    pub extensions: Vec<String>,
    /// Directory of locale message files.
    pub directory: Option<std::path::PathBuf>,
    /// Locale used when a request's locale has no template.
    pub default_locale: String,
    /// File name suffix of locale files.
    pub suffix: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            directory: None,
            default_locale: "en".to_string(),
            suffix: ".json".to_string(),
        }
    }
}

/// Compiles JSON Schema definitions with custom formats and localized messages.
#[derive(Clone)]
pub struct JsonSchemaService {
    formats: LoadedFormats,
    catalog: Arc<MessageCatalog>,
}

impl fmt::Debug for JsonSchemaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaService")
            .field("extensions", &self.formats.extensions())
            .field("locales", &self.catalog.locales().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for JsonSchemaService {
    fn default() -> Self {
        Self::new(ExtensionRegistry::with_defaults().load(&[]), MessageCatalog::new("en"))
    }
}

impl JsonSchemaService {
    /// Creates a service from loaded formats and a catalog.
    #[must_use]
    pub fn new(formats: LoadedFormats, catalog: MessageCatalog) -> Self {
        Self {
            formats,
            catalog: Arc::new(catalog),
        }
    }

    /// Builds a service from options, using `registry` to resolve extensions.
    ///
    /// A catalog directory that cannot be loaded is logged and replaced by an
    /// empty catalog.
    #[must_use]
    pub fn from_options(options: &SchemaOptions, registry: &ExtensionRegistry) -> Self {
        let formats = registry.load(&options.extensions);
        let catalog = match &options.directory {
            Some(directory) => {
                match MessageCatalog::load(directory, &options.suffix, options.default_locale.clone()) {
                    Ok(catalog) => catalog,
                    Err(err) => {
                        warn!(error = %err, "validation messages unavailable");
                        MessageCatalog::new(options.default_locale.clone())
                    }
                }
            }
            None => MessageCatalog::new(options.default_locale.clone()),
        };
        Self::new(formats, catalog)
    }

    /// The message catalog.
    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Names of the loaded extensions.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        self.formats.extensions()
    }
}

impl SchemaService for JsonSchemaService {
    fn compile(&self, definition: &Value) -> Result<Arc<dyn CompiledSchema>, SchemaError> {
        let mut options = jsonschema::options();
        for (name, check) in self.formats.formats() {
            options.with_format(*name, *check);
        }
        options.should_validate_formats(true);

        let validator = options
            .build(definition)
            .map_err(|err| SchemaError::new(format!("invalid schema: {err}")))?;

        debug!("schema compiled");
        Ok(Arc::new(JsonSchema {
            definition: definition.clone(),
            validator,
            catalog: Arc::clone(&self.catalog),
        }))
    }
}

/// A compiled JSON Schema.
pub struct JsonSchema {
    definition: Value,
    validator: Validator,
    catalog: Arc<MessageCatalog>,
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

fn keyword_of(schema_path: &str) -> Option<String> {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .map(str::to_string)
}

impl CompiledSchema for JsonSchema {
    fn definition(&self) -> &Value {
        &self.definition
    }

    fn validate(&self, value: Value, locale: Option<&str>) -> Result<Value, SchemaViolation> {
        let value = coerce(value, &self.definition);

        let issues: Vec<Issue> = self
            .validator
            .iter_errors(&value)
            .map(|err| {
                let path = err.instance_path.to_string();
                let keyword = keyword_of(&err.schema_path.to_string());
                let default_message = err.to_string();

                let mut vars = vec![
                    ("path", if path.is_empty() { "value".to_string() } else { path.clone() }),
                    ("value", err.instance.to_string()),
                    ("message", default_message.clone()),
                ];
                if let ValidationErrorKind::Required { property } = &err.kind {
                    let property = property
                        .as_str()
                        .map_or_else(|| property.to_string(), str::to_string);
                    vars.push(("property", property));
                }

                let message = keyword
                    .as_deref()
                    .and_then(|keyword| {
                        vars.push(("keyword", keyword.to_string()));
                        self.catalog.render(locale, keyword, &vars)
                    })
                    .unwrap_or(default_message);

                let issue = Issue::new(path, message);
                match keyword {
                    Some(keyword) => issue.with_keyword(keyword),
                    None => issue,
                }
            })
            .collect();

        match issues.first() {
            None => Ok(value),
            Some(first) => Err(SchemaViolation::new(first.message.clone(), issues)),
        }
    }
}
