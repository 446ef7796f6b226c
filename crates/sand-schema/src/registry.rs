//! Schema registry
//!
//! Loads a [`SchemaDocument`] from disk once per run.

use crate::document::SchemaDocument;
use crate::error::{SchemaError, SchemaResult};
use std::io::ErrorKind;
use std::path::Path;

/// Load a schema document from a YAML file
///
/// # Errors
/// - `SchemaError::ConfigNotFound` if `path` does not exist
/// - `SchemaError::ConfigParseError` if the file is malformed
/// - `SchemaError::Io` for any other read failure
pub fn load(path: impl AsRef<Path>) -> SchemaResult<SchemaDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SchemaError::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => SchemaError::io_error(path, e),
    })?;

    let document = SchemaDocument::parse(&content, path)?;
    tracing::debug!(
        path = %path.display(),
        fields = document.len(),
        sections = document.sections().len(),
        "loaded schema"
    );
    Ok(document)
}
