//! Source interface
//!
//! The set of fields a data source provides, together with the data itself:
//! set domains and parameter tables. Built once through
//! [`SourceInterfaceBuilder`] and read-only afterwards.

use crate::table::ParamTable;
use crate::years::{YearRange, YEAR};
use indexmap::IndexMap;
use sand_schema::{FieldKind, FieldSet};

/// A field declared by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceField {
    name: String,
    kind: FieldKind,
    indices: Vec<String>,
}

impl InterfaceField {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Index names recorded for this field; empty for sets
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[String] {
        &self.indices
    }
}

/// Field names declared by the source, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceFieldSet {
    fields: IndexMap<String, InterfaceField>,
}

impl InterfaceFieldSet {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InterfaceField> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceField> {
        self.fields.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
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

    fn declare(&mut self, name: &str, kind: FieldKind, indices: Vec<String>) {
        self.fields.insert(
            name.to_string(),
            InterfaceField {
                name: name.to_string(),
                kind,
                indices,
            },
        );
    }
}

impl FieldSet for InterfaceFieldSet {
    fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Data read from a clicSAND workbook or an otoole CSV directory
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInterface {
    fields: InterfaceFieldSet,
    domains: IndexMap<String, Vec<String>>,
    tables: IndexMap<String, ParamTable>,
    years: YearRange,
}

impl SourceInterface {
    #[must_use]
    pub fn builder(years: YearRange) -> SourceInterfaceBuilder {
        SourceInterfaceBuilder::new(years)
    }

    /// Fields the source declares
    #[inline]
    #[must_use]
    pub fn field_set(&self) -> &InterfaceFieldSet {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_field(name)
    }

    /// Values of an index; `None` if the source has no domain for it
    #[must_use]
    pub fn domain(&self, index: &str) -> Option<&[String]> {
        self.domains.get(index).map(Vec::as_slice)
    }

    /// All known domains, in insertion order
    pub fn domains(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.domains.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&ParamTable> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ParamTable> {
        self.tables.values()
    }

    /// Elements of a declared set
    ///
    /// Unlike [`domain`](Self::domain), only answers for names the field set
    /// declares as sets.
    #[must_use]
    pub fn set_values(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name)?.kind() {
            FieldKind::Set => self.domain(name),
            FieldKind::Param | FieldKind::Result => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn years(&self) -> YearRange {
        self.years
    }
}

/// Builder for [`SourceInterface`]
#[derive(Debug, Clone)]
pub struct SourceInterfaceBuilder {
    fields: InterfaceFieldSet,
    domains: IndexMap<String, Vec<String>>,
    tables: IndexMap<String, ParamTable>,
    years: YearRange,
}

impl SourceInterfaceBuilder {
    #[must_use]
    pub fn new(years: YearRange) -> Self {
        Self {
            fields: InterfaceFieldSet::default(),
            domains: IndexMap::new(),
            tables: IndexMap::new(),
            years,
        }
    }

    /// Declare a set field with its elements
    #[must_use]
    pub fn set<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.declare(name, FieldKind::Set, Vec::new());
        self.domains
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Record a domain without declaring a field
    #[must_use]
    pub fn domain<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a parameter field with its values
    #[must_use]
    pub fn param(mut self, table: ParamTable) -> Self {
        self.fields
            .declare(table.name(), FieldKind::Param, table.indices().to_vec());
        self.tables.insert(table.name().to_string(), table);
        self
    }

    /// Finish; YEAR is always declared with the year range as its domain
    #[must_use]
    pub fn build(mut self) -> SourceInterface {
        self.fields.declare(YEAR, FieldKind::Set, Vec::new());
        self.domains.insert(YEAR.to_string(), self.years.domain());

        tracing::debug!(
            fields = self.fields.len(),
            tables = self.tables.len(),
            domains = self.domains.len(),
            "built source interface"
        );
        SourceInterface {
            fields: self.fields,
            domains: self.domains,
            tables: self.tables,
            years: self.years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sand_schema::{non_required_fields, SchemaDocument};

    fn source() -> SourceInterface {
        let mut cost = ParamTable::new("CapitalCost", vec!["TECHNOLOGY".into(), "YEAR".into()]);
        cost.insert(vec!["COAL".into(), "2015".into()], 1500.0).unwrap();

        SourceInterface::builder(YearRange::new(2015, 2017).unwrap())
            .set("TECHNOLOGY", ["COAL", "GAS"])
            .domain("MODE_OF_OPERATION", ["1", "2"])
            .param(cost)
            .build()
    }

    #[test]
    fn year_domain_comes_from_range() {
        let source = source();
        assert!(source.contains("YEAR"));
        assert_eq!(source.domain("YEAR").unwrap(), ["2015", "2016", "2017"]);
    }

    #[test]
    fn year_range_overrides_explicit_year_set() {
        let source = SourceInterface::builder(YearRange::new(2020, 2021).unwrap())
            .set("YEAR", ["1990"])
            .build();
        assert_eq!(source.set_values("YEAR").unwrap(), ["2020", "2021"]);
        assert_eq!(source.field_set().len(), 1);
    }

    #[test]
    fn domain_only_entries_are_not_fields() {
        let source = source();
        assert!(!source.contains("MODE_OF_OPERATION"));
        assert_eq!(source.domain("MODE_OF_OPERATION").unwrap(), ["1", "2"]);
        assert!(source.set_values("MODE_OF_OPERATION").is_none());
    }

    #[test]
    fn params_record_their_indices() {
        let source = source();
        let field = source.field_set().get("CapitalCost").unwrap();
        assert_eq!(field.kind(), FieldKind::Param);
        assert_eq!(field.indices(), ["TECHNOLOGY", "YEAR"]);
        assert!(source.set_values("CapitalCost").is_none());
        assert_eq!(source.table("CapitalCost").unwrap().len(), 1);
    }

    #[test]
    fn field_set_drives_classification() {
        let schema = SchemaDocument::from_yaml_str(
            r"
TECHNOLOGY:
  type: set
FUEL:
  type: set
CapitalCost:
  indices: [TECHNOLOGY, YEAR]
  type: param
",
        )
        .unwrap();
        let source = source();
        assert_eq!(non_required_fields(&schema, source.field_set()), vec!["FUEL"]);
    }
}
