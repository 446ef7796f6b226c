//! Schema documents
//!
//! A [`SchemaDocument`] is the typed form of an otoole `config.yaml`. Two
//! layouts are accepted:
//!
//! ```yaml
//! # flat: every top-level key is a field
//! REGION:
//!   dtype: str
//!   type: set
//! CapitalCost:
//!   indices: [REGION, TECHNOLOGY, YEAR]
//!   type: param
//!   dtype: float
//!   default: 0
//! ```
//!
//! ```yaml
//! # sectioned: a top-level key without `type` groups fields
//! storage:
//!   STORAGE:
//!     dtype: str
//!     type: set
//! ```
//!
//! Both may be mixed. A field name may recur across sections. Index names are
//! interned into an index table and fields refer to them by [`IndexId`].

use crate::descriptor::{DType, FieldDescriptor, FieldKind, IndexId};
use crate::error::{SchemaError, SchemaResult};
use indexmap::{IndexMap, IndexSet};
use serde_yaml::{Mapping, Value};
use std::path::Path;

const IN_MEMORY: &str = "<memory>";

/// A named (or top-level) group of fields
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// `None` for top-level fields
    name: Option<String>,
    fields: IndexMap<String, FieldDescriptor>,
}

impl Section {
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Typed schema configuration
///
/// Documents are values: reconciliation produces a new document instead of
/// editing one in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDocument {
    sections: Vec<Section>,
    indices: IndexSet<String>,
}

impl SchemaDocument {
    /// Parse from a YAML string
    ///
    /// # Errors
    /// Returns `ConfigParseError` if the structure is invalid
    pub fn from_yaml_str(yaml: &str) -> SchemaResult<Self> {
        Self::parse(yaml, Path::new(IN_MEMORY))
    }

    /// Parse YAML read from `origin`, used in error messages
    pub(crate) fn parse(yaml: &str, origin: &Path) -> SchemaResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| SchemaError::parse_error(origin, None, e.to_string()))?;

        let top = match value {
            Value::Mapping(map) => map,
            Value::Null => {
                return Err(SchemaError::parse_error(origin, None, "empty schema document"))
            }
            _ => {
                return Err(SchemaError::parse_error(
                    origin,
                    None,
                    "top level must be a mapping of fields",
                ))
            }
        };

        let mut builder = DocumentBuilder::default();
        for (key, entry) in &top {
            let name = key_str(key, origin)?;
            let Value::Mapping(entry_map) = entry else {
                return Err(SchemaError::parse_error(
                    origin,
                    Some(name),
                    "entry must be a mapping",
                ));
            };

            if declares_kind(entry_map) {
                let raw = RawField::from_mapping(name, entry_map, origin)?;
                builder.push(None, raw);
            } else if entry_map.values().all(Value::is_mapping) {
                builder.open_section(name);
                for (field_key, field_entry) in entry_map {
                    let field_name = key_str(field_key, origin)?;
                    let field_map = field_entry.as_mapping().ok_or_else(|| {
                        SchemaError::parse_error(origin, Some(field_name), "entry must be a mapping")
                    })?;
                    if !declares_kind(field_map) {
                        return Err(SchemaError::parse_error(
                            origin,
                            Some(field_name),
                            "missing `type`",
                        ));
                    }
                    let raw = RawField::from_mapping(field_name, field_map, origin)?;
                    builder.push(Some(name), raw);
                }
            } else {
                return Err(SchemaError::parse_error(origin, Some(name), "missing `type`"));
            }
        }

        Ok(builder.build())
    }

    /// Serialize to YAML, preserving section layout and field order
    ///
    /// # Errors
    /// Returns `SchemaError::SerializeError` if YAML emission fails
    pub fn to_yaml_string(&self) -> SchemaResult<String> {
        let mut top = Mapping::new();
        for section in &self.sections {
            let mut fields = Mapping::new();
            for field in section.fields() {
                fields.insert(Value::String(field.name().to_string()), self.field_value(field));
            }
            match section.name() {
                None => top.extend(fields),
                Some(name) => {
                    top.insert(Value::String(name.to_string()), Value::Mapping(fields));
                }
            }
        }
        serde_yaml::to_string(&Value::Mapping(top))
            .map_err(|source| SchemaError::SerializeError { source })
    }

    fn field_value(&self, field: &FieldDescriptor) -> Value {
        let mut map = Mapping::new();
        if !field.is_scalar() {
            let indices = self
                .index_names(field)
                .into_iter()
                .map(|name| Value::String(name.to_string()))
                .collect();
            map.insert("indices".into(), Value::Sequence(indices));
        }
        map.insert("type".into(), field.kind().as_str().into());
        if let Some(dtype) = field.dtype() {
            map.insert("dtype".into(), dtype.as_str().into());
        }
        if let Some(short_name) = field.short_name() {
            map.insert("short_name".into(), short_name.into());
        }
        for (key, value) in field.attributes() {
            map.insert(Value::String(key.clone()), value.clone());
        }
        Value::Mapping(map)
    }

    /// Sections in declaration order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every field occurrence across all sections, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(|s| s.fields())
    }

    /// First occurrence of a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.sections.iter().find_map(|s| s.field(name))
    }

    /// Number of sections a field name occurs in
    #[must_use]
    pub fn occurrences(&self, name: &str) -> usize {
        self.sections
            .iter()
            .filter(|s| s.field(name).is_some())
            .count()
    }

    /// Total number of field occurrences
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve an index name to its handle
    #[inline]
    #[must_use]
    pub fn index_id(&self, name: &str) -> Option<IndexId> {
        self.indices.get_index_of(name).map(IndexId::from_position)
    }

    /// Resolve a handle back to its index name
    #[inline]
    #[must_use]
    pub fn index_name(&self, id: IndexId) -> Option<&str> {
        self.indices.get_index(id.position()).map(String::as_str)
    }

    /// Index names of a field, in declared order
    #[must_use]
    pub fn index_names(&self, field: &FieldDescriptor) -> Vec<&str> {
        field
            .indices()
            .iter()
            .filter_map(|id| self.index_name(*id))
            .collect()
    }

    /// Map from sheet name (short name if any) to full field name
    #[must_use]
    pub fn full_names(&self) -> IndexMap<String, String> {
        let mut names = IndexMap::new();
        for field in self.fields() {
            let sheet = field.short_name().unwrap_or(field.name());
            names
                .entry(sheet.to_string())
                .or_insert_with(|| field.name().to_string());
        }
        names
    }

    /// Map from full field name to sheet name
    #[must_use]
    pub fn short_names(&self) -> IndexMap<String, String> {
        self.full_names()
            .into_iter()
            .map(|(short, full)| (full, short))
            .collect()
    }

    /// Build a new document keeping only fields accepted by `keep`
    ///
    /// Sections are kept even when emptied. The index table is rebuilt from
    /// the surviving fields.
    #[must_use]
    pub fn retain_fields(&self, mut keep: impl FnMut(&FieldDescriptor) -> bool) -> Self {
        let mut builder = DocumentBuilder::default();
        for section in &self.sections {
            if let Some(name) = section.name() {
                builder.open_section(name);
            }
            for field in section.fields().filter(|f| keep(*f)) {
                let raw = RawField {
                    name: field.name().to_string(),
                    kind: field.kind(),
                    indices: self
                        .index_names(field)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    dtype: field.dtype(),
                    short_name: field.short_name().map(str::to_string),
                    attributes: field.attributes().clone(),
                };
                builder.push(section.name(), raw);
            }
        }
        builder.build()
    }
}

/// Field as read from YAML, before index interning
struct RawField {
    name: String,
    kind: FieldKind,
    indices: Vec<String>,
    dtype: Option<DType>,
    short_name: Option<String>,
    attributes: IndexMap<String, Value>,
}

impl RawField {
    fn from_mapping(name: &str, map: &Mapping, origin: &Path) -> SchemaResult<Self> {
        let err = |message: String| SchemaError::parse_error(origin, Some(name), message);

        let mut kind = None;
        let mut indices = Vec::new();
        let mut dtype = None;
        let mut short_name = None;
        let mut attributes = IndexMap::new();

        for (key, value) in map {
            let key = key_str(key, origin)?;
            match key {
                "type" | "kind" => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| err(format!("`{key}` must be a string")))?;
                    kind = Some(text.parse::<FieldKind>().map_err(err)?);
                }
                "indices" => indices = parse_indices(value).map_err(err)?,
                "dtype" => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| err("`dtype` must be a string".to_string()))?;
                    dtype = Some(text.parse::<DType>().map_err(err)?);
                }
                "short_name" => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| err("`short_name` must be a string".to_string()))?;
                    short_name = Some(text.to_string());
                }
                other => {
                    attributes.insert(other.to_string(), value.clone());
                }
            }
        }

        let kind = kind.ok_or_else(|| err("missing `type`".to_string()))?;
        Ok(Self {
            name: name.to_string(),
            kind,
            indices,
            dtype,
            short_name,
            attributes,
        })
    }
}

fn parse_indices(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => {
            let mut names: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let name = item
                    .as_str()
                    .ok_or_else(|| "`indices` entries must be strings".to_string())?;
                if names.iter().any(|n| n == name) {
                    return Err(format!("index `{name}` listed twice"));
                }
                names.push(name.to_string());
            }
            Ok(names)
        }
        _ => Err("`indices` must be a list".to_string()),
    }
}

fn declares_kind(map: &Mapping) -> bool {
    map.contains_key("type") || map.contains_key("kind")
}

fn key_str<'a>(key: &'a Value, origin: &Path) -> SchemaResult<&'a str> {
    key.as_str()
        .ok_or_else(|| SchemaError::parse_error(origin, None, format!("non-string key {key:?}")))
}

/// Accumulates sections and interns index names in first-seen order
#[derive(Default)]
struct DocumentBuilder {
    sections: Vec<Section>,
    indices: IndexSet<String>,
}

impl DocumentBuilder {
    fn section_mut(&mut self, name: Option<&str>) -> &mut Section {
        let position = match self.sections.iter().position(|s| s.name() == name) {
            Some(position) => position,
            None => {
                let section = Section {
                    name: name.map(str::to_string),
                    fields: IndexMap::new(),
                };
                // Top-level fields always come first.
                if name.is_none() {
                    self.sections.insert(0, section);
                    0
                } else {
                    self.sections.push(section);
                    self.sections.len() - 1
                }
            }
        };
        &mut self.sections[position]
    }

    fn open_section(&mut self, name: &str) {
        self.section_mut(Some(name));
    }

    fn push(&mut self, section: Option<&str>, raw: RawField) {
        let ids = raw
            .indices
            .iter()
            .map(|index| IndexId::from_position(self.indices.insert_full(index.clone()).0))
            .collect();
        let field = FieldDescriptor::new(raw.name.clone(), raw.kind, ids)
            .with_dtype(raw.dtype)
            .with_short_name(raw.short_name)
            .with_attributes(raw.attributes);
        self.section_mut(section).fields.insert(raw.name, field);
    }

    fn build(self) -> SchemaDocument {
        tracing::debug!(
            sections = self.sections.len(),
            indices = self.indices.len(),
            "built schema document"
        );
        SchemaDocument {
            sections: self.sections,
            indices: self.indices,
        }
    }
}
