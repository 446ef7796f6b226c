//! otoole `data_csv` directory reader
//!
//! One file per field. A file whose header is exactly `VALUE` holds a set;
//! any other header lists the parameter's indices followed by `VALUE`.

use crate::error::{SourceError, SourceResult};
use crate::interface::SourceInterface;
use crate::table::ParamTable;
use crate::years::{YearRange, YEAR};
use std::fs;
use std::path::{Path, PathBuf};

/// Value column of every otoole CSV file
pub const VALUE: &str = "VALUE";

impl SourceInterface {
    /// Read every `<name>.csv` in `dir`, in file name order
    ///
    /// # Errors
    /// Returns `SourceError::Io` if the directory or a file cannot be read,
    /// `SourceError::Csv` on malformed CSV, `SourceError::MissingColumn` if a
    /// parameter file lacks `VALUE` and `SourceError::InvalidNumber` on a
    /// non-numeric value or year
    pub fn from_csv_dir(dir: impl AsRef<Path>, years: YearRange) -> SourceResult<Self> {
        let dir = dir.as_ref();
        let mut builder = SourceInterface::builder(years);

        for path in csv_files(dir)? {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content =
                fs::read_to_string(&path).map_err(|e| SourceError::io_error(&path, e))?;

            match read_sheet(name, &content)? {
                Sheet::Set(values) => builder = builder.set(name, values),
                Sheet::Param(table) => builder = builder.param(table),
            }
        }

        let source = builder.build();
        tracing::info!(
            dir = %dir.display(),
            fields = source.field_set().len(),
            "loaded csv directory"
        );
        Ok(source)
    }
}

enum Sheet {
    Set(Vec<String>),
    Param(ParamTable),
}

pub(crate) fn csv_files(dir: &Path) -> SourceResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| SourceError::io_error(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SourceError::io_error(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_sheet(name: &str, content: &str) -> SourceResult<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::csv_error(name, e))?
        .iter()
        .map(ToString::to_string)
        .collect();

    let Some(value_at) = headers.iter().position(|h| h == VALUE) else {
        return Err(SourceError::missing_column(name, VALUE));
    };

    if headers.len() == 1 {
        let mut values = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SourceError::csv_error(name, e))?;
            match record.get(0) {
                Some(value) if !value.is_empty() => values.push(value.to_string()),
                _ => {}
            }
        }
        return Ok(Sheet::Set(values));
    }

    let indices: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != value_at)
        .map(|(_, h)| h.clone())
        .collect();
    let mut table = ParamTable::new(name, indices);

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| SourceError::csv_error(name, e))?;
        let line = row + 2;

        let raw = record.get(value_at).unwrap_or_default();
        if raw.is_empty() {
            continue;
        }
        let value = parse_number(name, line, raw)?;

        let mut key = Vec::with_capacity(headers.len() - 1);
        for (i, cell) in record.iter().enumerate() {
            if i == value_at {
                continue;
            }
            if headers[i] == YEAR {
                key.push(parse_year(name, line, cell)?.to_string());
            } else {
                key.push(cell.to_string());
            }
        }
        table.insert(key, value)?;
    }

    tracing::debug!(field = name, rows = table.len(), "read parameter csv");
    Ok(Sheet::Param(table))
}

pub(crate) fn parse_number(field: &str, row: usize, raw: &str) -> SourceResult<f64> {
    raw.parse().map_err(|_| SourceError::InvalidNumber {
        field: field.to_string(),
        row,
        value: raw.to_string(),
    })
}

/// Years may be exported as floats (`2015.0`); anything fractional is rejected
pub(crate) fn parse_year(field: &str, row: usize, raw: &str) -> SourceResult<i32> {
    let invalid = || SourceError::InvalidNumber {
        field: field.to_string(),
        row,
        value: raw.to_string(),
    };
    if let Ok(year) = raw.parse::<i32>() {
        return Ok(year);
    }
    let year: f64 = raw.parse().map_err(|_| invalid())?;
    if year.fract() != 0.0 || year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        return Err(invalid());
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(year as i32)
}
