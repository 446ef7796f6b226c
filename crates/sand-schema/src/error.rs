//! Error types for schema loading and persistence
//!
//! Covers:
//! - Missing schema files
//! - Malformed schema structure
//! - YAML emission failures
//! - Failed all-or-nothing writes

use std::path::{Path, PathBuf};

/// Errors raised while loading, reconciling or persisting a schema document
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Schema file does not exist
    #[error("config not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Schema file exists but its structure is invalid
    #[error("{}", parse_message(path, field.as_deref(), message))]
    ConfigParseError {
        path: PathBuf,
        field: Option<String>,
        message: String,
    },

    /// Persisting failed; the previous file is left untouched
    #[error("failed to persist {}: {source}", path.display())]
    PartialWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be emitted as YAML
    #[error("failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: serde_yaml::Error,
    },

    /// Any other filesystem failure
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// Create a parse error for an optional field
    pub fn parse_error(
        path: impl Into<PathBuf>,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn partial_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PartialWriteError {
            path: path.into(),
            source,
        }
    }

    /// Offending field name, when the error is tied to one
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ConfigParseError { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

fn parse_message(path: &Path, field: Option<&str>, message: &str) -> String {
    match field {
        Some(field) => format!(
            "invalid config {}: field `{field}`: {message}",
            path.display()
        ),
        None => format!("invalid config {}: {message}", path.display()),
    }
}

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
