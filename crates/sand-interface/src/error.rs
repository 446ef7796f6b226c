//! Error types for reading source interface data

use std::path::PathBuf;

/// Errors raised while building a source interface
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error reading a file or directory
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV syntax error
    #[error("csv error in {sheet}: {source}")]
    Csv {
        sheet: String,
        #[source]
        source: csv::Error,
    },

    /// Required column is absent
    #[error("{sheet}: missing column `{column}`")]
    MissingColumn { sheet: String, column: String },

    /// Workbook has no sheet of that name
    #[error("no sheet named `{sheet}`")]
    MissingSheet { sheet: String },

    /// Sheet content does not follow the expected layout
    #[error("{sheet}: {message}")]
    MalformedSheet { sheet: String, message: String },

    /// Cell that should hold a number does not
    #[error("{field}: invalid number `{value}` on row {row}")]
    InvalidNumber {
        field: String,
        row: usize,
        value: String,
    },

    /// Row key length does not match the table's indices
    #[error("{field}: expected {expected} index values, got {actual}")]
    KeyArity {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Start year after end year
    #[error("invalid year range: {start} > {end}")]
    InvalidYearRange { start: i32, end: i32 },
}

impl SourceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create CSV error for a sheet
    pub fn csv_error(sheet: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            sheet: sheet.into(),
            source,
        }
    }

    /// Create missing column error
    pub fn missing_column(sheet: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            sheet: sheet.into(),
            column: column.into(),
        }
    }

    /// Create malformed sheet error
    pub fn malformed(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSheet {
            sheet: sheet.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_display() {
        let err = SourceError::missing_column("SETS", "Technologies");
        assert_eq!(err.to_string(), "SETS: missing column `Technologies`");
    }

    #[test]
    fn invalid_number_display() {
        let err = SourceError::InvalidNumber {
            field: "CapitalCost".to_string(),
            row: 3,
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "CapitalCost: invalid number `abc` on row 3");
    }

    #[test]
    fn year_range_display() {
        let err = SourceError::InvalidYearRange {
            start: 2070,
            end: 2015,
        };
        assert_eq!(err.to_string(), "invalid year range: 2070 > 2015");
    }
}
