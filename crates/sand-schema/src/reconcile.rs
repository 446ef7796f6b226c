//! Config reconciliation
//!
//! Regenerates a schema document holding only the input fields a source
//! interface actually provides. Result fields are solver outputs and are
//! always kept.

use crate::classify::{dangling_results, non_required_fields, FieldSet};
use crate::descriptor::FieldKind;
use crate::document::SchemaDocument;
use crate::error::{SchemaError, SchemaResult};
use crate::persist::write_atomic;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default file name of the reconciled config
pub const SAND_CONFIG_FILE: &str = "sand_config.yaml";

/// Build a new document without the fields the interface does not provide
///
/// Every occurrence of a non-required name is removed, in every section.
/// Reconciling an already reconciled document against the same interface
/// returns it unchanged.
#[must_use]
pub fn reconcile<S>(schema: &SchemaDocument, interface: &S) -> SchemaDocument
where
    S: FieldSet + ?Sized,
{
    let removed: HashSet<String> = non_required_fields(schema, interface).into_iter().collect();
    let reconciled =
        schema.retain_fields(|field| field.kind() == FieldKind::Result || !removed.contains(field.name()));

    tracing::debug!(
        before = schema.len(),
        after = reconciled.len(),
        removed = removed.len(),
        "reconciled schema"
    );
    reconciled
}

/// Persist a document as YAML, all or nothing
///
/// # Errors
/// Returns `SchemaError::PartialWriteError` if the write fails; the previous
/// file at `path` is left untouched
pub fn write(document: &SchemaDocument, path: impl AsRef<Path>) -> SchemaResult<()> {
    let yaml = document.to_yaml_string()?;
    write_atomic(path, yaml.as_bytes())
}

/// Outcome of [`write_sand_config`]
#[derive(Debug, Clone, PartialEq)]
pub struct SandConfig {
    /// Reconciled document
    pub document: SchemaDocument,
    /// Where it was written
    pub path: PathBuf,
    /// Non-required field names, one per removed occurrence
    pub removed: Vec<String>,
    /// Kept results defined over a removed set
    pub dangling: Vec<String>,
}

/// Reconcile `schema` and write it next to `config_path`
///
/// The reconciled file is named `file_name` and lives in the directory of
/// `config_path`.
///
/// # Errors
/// Returns `SchemaError::PartialWriteError` if the write fails
pub fn write_sand_config<S>(
    schema: &SchemaDocument,
    interface: &S,
    config_path: impl AsRef<Path>,
    file_name: &str,
) -> SchemaResult<SandConfig>
where
    S: FieldSet + ?Sized,
{
    let removed = non_required_fields(schema, interface);
    let dangling = dangling_results(schema, interface);
    let document = reconcile(schema, interface);

    let path = sibling_path(config_path.as_ref(), file_name);
    write(&document, &path)?;

    tracing::info!(
        path = %path.display(),
        fields = document.len(),
        removed = removed.len(),
        "wrote reconciled config"
    );
    Ok(SandConfig {
        document,
        path,
        removed,
        dangling,
    })
}

/// Delete `<name>.csv` for each removed field from a CSV data directory
///
/// Missing files are skipped. Returns the paths actually deleted.
///
/// # Errors
/// Returns `SchemaError::Io` if a file exists but cannot be removed
pub fn prune_csv_dir(dir: impl AsRef<Path>, removed: &[String]) -> SchemaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut deleted = Vec::new();
    let mut seen = HashSet::new();

    for name in removed {
        if !seen.insert(name.as_str()) {
            continue;
        }
        let path = dir.join(format!("{name}.csv"));
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed csv for non-required field");
                deleted.push(path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(SchemaError::io_error(path, e)),
        }
    }
    Ok(deleted)
}

fn sibling_path(config_path: &Path, file_name: &str) -> PathBuf {
    match config_path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r"
YEAR:
  type: set
DiscountRate:
  type: param
Conversionls:
  indices: [YEAR]
  type: param
NewCapacity:
  indices: [YEAR]
  type: result
";

    fn schema() -> SchemaDocument {
        SchemaDocument::from_yaml_str(SCHEMA).unwrap()
    }

    fn names(doc: &SchemaDocument) -> Vec<&str> {
        doc.fields().map(|f| f.name()).collect()
    }

    #[test]
    fn reconcile_removes_missing_inputs_and_keeps_results() {
        let interface: &[&str] = &["YEAR", "DiscountRate"];
        let reconciled = reconcile(&schema(), interface);
        assert_eq!(names(&reconciled), vec!["YEAR", "DiscountRate", "NewCapacity"]);
    }

    #[test]
    fn reconcile_does_not_mutate_input() {
        let schema = schema();
        let interface: &[&str] = &[];
        let _ = reconcile(&schema, interface);
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn reconcile_keeps_result_sharing_a_removed_name() {
        let schema = SchemaDocument::from_yaml_str(
            r"
Demand:
  type: param
results:
  Demand:
    type: result
",
        )
        .unwrap();
        let interface: &[&str] = &[];
        let reconciled = reconcile(&schema, interface);

        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled.field("Demand").unwrap().kind(), FieldKind::Result);
    }

    #[test]
    fn reconcile_purges_every_occurrence() {
        let schema = SchemaDocument::from_yaml_str(
            r"
STORAGE:
  type: set
REGION:
  type: set
storage:
  STORAGE:
    type: set
",
        )
        .unwrap();
        let interface: &[&str] = &["REGION"];
        let reconciled = reconcile(&schema, interface);

        assert_eq!(reconciled.occurrences("STORAGE"), 0);
        assert_eq!(names(&reconciled), vec!["REGION"]);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let interface: &[&str] = &["YEAR", "DiscountRate"];
        let once = reconcile(&schema(), interface);
        let twice = reconcile(&once, interface);
        assert_eq!(once, twice);
    }

    #[test]
    fn write_sand_config_next_to_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, SCHEMA).unwrap();

        let interface: &[&str] = &["YEAR", "DiscountRate"];
        let outcome =
            write_sand_config(&schema(), interface, &config_path, SAND_CONFIG_FILE).unwrap();

        assert_eq!(outcome.path, dir.path().join(SAND_CONFIG_FILE));
        assert_eq!(outcome.removed, vec!["Conversionls"]);
        assert!(outcome.dangling.is_empty());
        let written = crate::registry::load(&outcome.path).unwrap();
        assert_eq!(written, outcome.document);
        // The source config is regenerated into a new file, never edited.
        assert_eq!(fs::read_to_string(&config_path).unwrap(), SCHEMA);
    }

    #[test]
    fn write_failure_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join(SAND_CONFIG_FILE);
        fs::create_dir(&target).unwrap();

        let err = write(&schema(), &target).unwrap_err();
        assert!(matches!(err, SchemaError::PartialWriteError { .. }));
        assert!(target.is_dir());
    }

    #[test]
    fn prune_removes_only_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Conversionls.csv"), "VALUE\n").unwrap();
        fs::write(dir.path().join("YEAR.csv"), "VALUE\n2015\n").unwrap();

        let removed = vec![
            "Conversionls".to_string(),
            "Conversionls".to_string(),
            "Missing".to_string(),
        ];
        let deleted = prune_csv_dir(dir.path(), &removed).unwrap();

        assert_eq!(deleted, vec![dir.path().join("Conversionls.csv")]);
        assert!(dir.path().join("YEAR.csv").exists());
    }
}
