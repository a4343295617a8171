use std::path::PathBuf;

use thiserror::Error;

/// A message catalog could not be loaded.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The directory or a file could not be read.
    #[error("failed to read message catalog {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A locale file is not a JSON object of strings.
    #[error("failed to parse message catalog {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A schema extension could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// No extension is registered under this name.
    #[error("unknown schema extension `{0}`")]
    Unknown(String),

    /// Two extensions define the same format.
    #[error("format `{format}` from extension `{extension}` is already defined")]
    DuplicateFormat {
        /// The extension being loaded.
        extension: String,
        /// The clashing format name.
        format: String,
    },
}
