//! Error types for template population and output

use sand_interface::SourceError;
use sand_schema::{FieldKind, SchemaError};
use std::path::PathBuf;

/// A template field whose shape differs from the source's
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{field}: template expects {expected_kind} [{}], source provides {found_kind} [{}]",
    join(.expected_indices),
    join(.found_indices)
)]
pub struct FieldShapeMismatch {
    pub field: String,
    pub expected_kind: FieldKind,
    pub expected_indices: Vec<String>,
    pub found_kind: FieldKind,
    pub found_indices: Vec<String>,
}

/// Errors raised while populating or writing a template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// One or more fields could not be populated
    #[error("{} field(s) do not match the source shape: {}", count(.0), mismatch_names(.0))]
    ShapeMismatches(Vec<FieldShapeMismatch>),

    /// Field is not part of the template
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// Field exists but is not a set
    #[error("`{0}` is not a set")]
    NotASet(String),

    /// Field exists but is not a parameter
    #[error("`{0}` is not a parameter")]
    NotAParam(String),

    /// Parameter is not indexed over a set the edit selects on
    #[error("`{field}` is not indexed over {index}")]
    MissingIndex { field: String, index: String },

    /// Parameter is indexed over a set the edit must not touch
    #[error("`{field}` depends on {index}")]
    UnexpectedIndex { field: String, index: String },

    /// Prep sheet could not be read
    #[error(transparent)]
    Source(#[from] SourceError),

    /// CSV serialization error
    #[error("csv error writing {field}: {source}")]
    Csv {
        field: String,
        #[source]
        source: csv::Error,
    },

    /// IO error preparing the output directory
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting a file failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn join(indices: &[String]) -> String {
    indices.join(", ")
}

fn count(mismatches: &[FieldShapeMismatch]) -> usize {
    mismatches.len()
}

fn mismatch_names(mismatches: &[FieldShapeMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| m.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> FieldShapeMismatch {
        FieldShapeMismatch {
            field: "CapitalCost".to_string(),
            expected_kind: FieldKind::Param,
            expected_indices: vec!["REGION".into(), "TECHNOLOGY".into(), "YEAR".into()],
            found_kind: FieldKind::Param,
            found_indices: vec!["TECHNOLOGY".into(), "YEAR".into()],
        }
    }

    #[test]
    fn mismatch_display_lists_both_shapes() {
        assert_eq!(
            mismatch().to_string(),
            "CapitalCost: template expects param [REGION, TECHNOLOGY, YEAR], \
             source provides param [TECHNOLOGY, YEAR]"
        );
    }

    #[test]
    fn index_errors_name_field_and_set() {
        let err = TemplateError::UnexpectedIndex {
            field: "SpecifiedAnnualDemand".to_string(),
            index: "TECHNOLOGY".to_string(),
        };
        assert_eq!(err.to_string(), "`SpecifiedAnnualDemand` depends on TECHNOLOGY");
    }

    #[test]
    fn shape_mismatches_display_names_fields() {
        let err = TemplateError::ShapeMismatches(vec![mismatch()]);
        assert_eq!(
            err.to_string(),
            "1 field(s) do not match the source shape: CapitalCost"
        );
    }
}
