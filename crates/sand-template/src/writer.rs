//! CSV output in the otoole `data_csv` layout
//!
//! One `<name>.csv` per field. Sets have a single `VALUE` column; parameters
//! list their indices followed by `VALUE`, with blank cells left empty.

use crate::error::{TemplateError, TemplateResult};
use crate::populate::{FieldValues, PopulatedField, PopulatedTemplate};
use sand_interface::VALUE;
use sand_schema::persist::write_atomic;
use std::fs;
use std::path::{Path, PathBuf};

/// File stem used for each field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetNaming {
    /// Full field name
    #[default]
    Full,
    /// `short_name` where the schema declares one; spreadsheet sheet names
    /// are limited to 31 characters
    Short,
}

/// Writes a populated template as a CSV directory
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTemplateWriter {
    naming: SheetNaming,
}

impl CsvTemplateWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_naming(mut self, naming: SheetNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Write every field of `template` into `dir`, creating it if needed
    ///
    /// Each file is replaced atomically. Returns the written paths in
    /// template order.
    ///
    /// # Errors
    /// Returns `TemplateError::Io` if `dir` cannot be created,
    /// `TemplateError::Csv` on serialization failure and
    /// `TemplateError::Schema` if a file cannot be persisted
    pub fn write(&self, template: &PopulatedTemplate, dir: impl AsRef<Path>) -> TemplateResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(template.len());
        for field in template.fields() {
            let path = dir.join(format!("{}.csv", self.file_stem(field)));
            write_atomic(&path, &render(field)?)?;
            written.push(path);
        }

        tracing::info!(dir = %dir.display(), files = written.len(), "wrote template csv");
        Ok(written)
    }

    fn file_stem<'a>(&self, field: &'a PopulatedField) -> &'a str {
        match self.naming {
            SheetNaming::Full => field.name(),
            SheetNaming::Short => field.short_name().unwrap_or(field.name()),
        }
    }
}

fn render(field: &PopulatedField) -> TemplateResult<Vec<u8>> {
    let csv_error = |source| TemplateError::Csv {
        field: field.name().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(Vec::new());

    match field.values() {
        FieldValues::Set(values) => {
            writer.write_record([VALUE]).map_err(csv_error)?;
            for value in values {
                writer.write_record([value]).map_err(csv_error)?;
            }
        }
        FieldValues::Param { indices, rows } => {
            let header = indices.iter().map(String::as_str).chain([VALUE]);
            writer.write_record(header).map_err(csv_error)?;
            for row in rows {
                let value = row.value.map(|v| v.to_string()).unwrap_or_default();
                let record = row.key.iter().map(String::as_str).chain([value.as_str()]);
                writer.write_record(record).map_err(csv_error)?;
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| csv_error(csv::Error::from(e.into_error())))
}
