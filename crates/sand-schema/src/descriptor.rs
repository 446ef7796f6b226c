//! Field descriptors
//!
//! Provides [`FieldKind`], [`DType`], [`IndexId`] and [`FieldDescriptor`],
//! the typed form of one entry in an otoole `config.yaml`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Kind of a schema field
///
/// Serialized in lowercase (`set`, `param`, `result`) as otoole writes it.
/// Parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Index dimension (REGION, TECHNOLOGY, YEAR, ...)
    Set,

    /// Numeric model input defined over zero or more sets
    Param,

    /// Solver output; never provided by an input interface
    Result,
}

impl FieldKind {
    /// Lowercase name as written in config files
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Param => "param",
            Self::Result => "result",
        }
    }

    /// Whether the field is a model input (set or param)
    #[inline]
    #[must_use]
    pub const fn is_input(self) -> bool {
        match self {
            Self::Set | Self::Param => true,
            Self::Result => false,
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set" => Ok(Self::Set),
            "param" => Ok(Self::Param),
            "result" => Ok(Self::Result),
            other => Err(format!("unknown field type `{other}`")),
        }
    }
}

/// Value type of a field's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Str,
    Int,
    Float,
}

impl DType {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

impl FromStr for DType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            other => Err(format!("unknown dtype `{other}`")),
        }
    }
}

/// Handle to an index name interned in a [`SchemaDocument`]
///
/// Only meaningful together with the document that issued it.
///
/// [`SchemaDocument`]: crate::SchemaDocument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub(crate) u32);

impl IndexId {
    #[inline]
    #[must_use]
    pub(crate) fn from_position(position: usize) -> Self {
        // Index tables are built from config files, far below u32::MAX entries.
        Self(u32::try_from(position).unwrap_or(u32::MAX))
    }

    #[inline]
    #[must_use]
    pub(crate) const fn position(self) -> usize {
        self.0 as usize
    }
}

/// One field of a schema document
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    indices: Vec<IndexId>,
    dtype: Option<DType>,
    short_name: Option<String>,
    /// Remaining keys (`default`, `calculated`, ...) kept verbatim
    attributes: IndexMap<String, serde_yaml::Value>,
}

impl FieldDescriptor {
    #[must_use]
    pub(crate) fn new(name: impl Into<String>, kind: FieldKind, indices: Vec<IndexId>) -> Self {
        Self {
            name: name.into(),
            kind,
            indices,
            dtype: None,
            short_name: None,
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub(crate) fn with_dtype(mut self, dtype: Option<DType>) -> Self {
        self.dtype = dtype;
        self
    }

    #[must_use]
    pub(crate) fn with_short_name(mut self, short_name: Option<String>) -> Self {
        self.short_name = short_name;
        self
    }

    #[must_use]
    pub(crate) fn with_attributes(mut self, attributes: IndexMap<String, serde_yaml::Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Ordered index handles the field is defined over
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[IndexId] {
        &self.indices
    }

    /// Check if the field is defined over an index
    #[inline]
    #[must_use]
    pub fn depends_on(&self, index: IndexId) -> bool {
        self.indices.contains(&index)
    }

    /// Check if the field has no index dependency at all
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    /// Sheet name used when the full name is too long for a spreadsheet tab
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, serde_yaml::Value> {
        &self.attributes
    }

    /// Look up an extra attribute such as `default`
    #[inline]
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("set".parse::<FieldKind>(), Ok(FieldKind::Set));
        assert_eq!("PARAM".parse::<FieldKind>(), Ok(FieldKind::Param));
        assert_eq!("Result".parse::<FieldKind>(), Ok(FieldKind::Result));
        assert!("variable".parse::<FieldKind>().is_err());
    }

    #[test]
    fn kind_input_classification() {
        assert!(FieldKind::Set.is_input());
        assert!(FieldKind::Param.is_input());
        assert!(!FieldKind::Result.is_input());
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(FieldKind::Result.to_string(), "result");
    }

    #[test]
    fn dtype_round_trip() {
        for dtype in [DType::Str, DType::Int, DType::Float] {
            assert_eq!(dtype.as_str().parse::<DType>(), Ok(dtype));
        }
        assert!("double".parse::<DType>().is_err());
    }

    #[test]
    fn descriptor_dependency() {
        let year = IndexId(0);
        let region = IndexId(1);
        let field = FieldDescriptor::new("CapitalCost", FieldKind::Param, vec![region, year]);

        assert!(field.depends_on(year));
        assert!(!field.depends_on(IndexId(2)));
        assert!(!field.is_scalar());
        assert_eq!(field.indices(), &[region, year]);
    }
}
