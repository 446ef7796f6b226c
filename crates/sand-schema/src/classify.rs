//! Field classification
//!
//! Queries over a [`SchemaDocument`]:
//! - which fields are independent of an index
//! - which fields the source interface does not provide
//!
//! Every query walks the document in declaration order, so results are
//! deterministic for a given input.

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::document::SchemaDocument;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Set of field names declared by a source interface
///
/// Implemented for the standard string sets so callers can classify against
/// a plain list of names.
pub trait FieldSet {
    /// Check if the interface declares a field
    fn contains_field(&self, name: &str) -> bool;
}

impl FieldSet for HashSet<String> {
    fn contains_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FieldSet for BTreeSet<String> {
    fn contains_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FieldSet for IndexSet<String> {
    fn contains_field(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FieldSet for [&str] {
    fn contains_field(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

impl<T: FieldSet + ?Sized> FieldSet for &T {
    fn contains_field(&self, name: &str) -> bool {
        (**self).contains_field(name)
    }
}

/// Whether an index's own SET counts as independent of that index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSetPolicy {
    /// Drop the SET named after the index (YEAR is not listed as
    /// YEAR-independent) - default
    #[default]
    Exclude,

    /// Keep it: a SET has no indices, so it is trivially independent
    Include,
}

/// Set and param fields that are not defined over `index_name`
///
/// Result fields are never considered. Names are reported once, at their
/// first occurrence.
#[must_use]
pub fn index_independent_fields(
    schema: &SchemaDocument,
    index_name: &str,
    policy: IndexSetPolicy,
) -> Vec<String> {
    let index = schema.index_id(index_name);
    let mut seen = IndexSet::new();

    for field in schema.fields() {
        let independent = match field.kind() {
            FieldKind::Result => false,
            FieldKind::Set if field.name() == index_name => policy == IndexSetPolicy::Include,
            FieldKind::Set | FieldKind::Param => index.map_or(true, |id| !field.depends_on(id)),
        };
        if independent {
            seen.insert(field.name().to_string());
        }
    }

    seen.into_iter().collect()
}

/// Input fields the interface does not declare
///
/// One entry per occurrence: a name declared in two sections and absent from
/// the interface is listed twice. Result fields never appear.
#[must_use]
pub fn non_required_fields<S>(schema: &SchemaDocument, interface: &S) -> Vec<String>
where
    S: FieldSet + ?Sized,
{
    schema
        .fields()
        .filter(|field| field.kind().is_input() && !interface.contains_field(field.name()))
        .map(|field| field.name().to_string())
        .collect()
}

/// Fields of the given kinds defined over `index_name`
///
/// Names are reported once, at their first occurrence.
#[must_use]
pub fn fields_depending_on(
    schema: &SchemaDocument,
    index_name: &str,
    kinds: &[FieldKind],
) -> Vec<String> {
    let Some(index) = schema.index_id(index_name) else {
        return Vec::new();
    };

    let names: IndexSet<String> = schema
        .fields()
        .filter(|field| kinds.contains(&field.kind()) && field.depends_on(index))
        .map(|field| field.name().to_string())
        .collect();
    names.into_iter().collect()
}

/// Every field occurrence of one kind
#[must_use]
pub fn fields_of_kind(schema: &SchemaDocument, kind: FieldKind) -> Vec<&FieldDescriptor> {
    schema.fields().filter(|field| field.kind() == kind).collect()
}

/// Result fields defined over a set the interface does not declare
///
/// Such results are kept by reconciliation but reference a set that is
/// removed along with it.
#[must_use]
pub fn dangling_results<S>(schema: &SchemaDocument, interface: &S) -> Vec<String>
where
    S: FieldSet + ?Sized,
{
    let removed_sets: HashSet<_> = schema
        .fields()
        .filter(|field| field.kind() == FieldKind::Set && !interface.contains_field(field.name()))
        .filter_map(|field| schema.index_id(field.name()))
        .collect();

    let names: IndexSet<String> = schema
        .fields()
        .filter(|field| field.kind() == FieldKind::Result)
        .filter(|field| field.indices().iter().any(|id| removed_sets.contains(id)))
        .map(|field| field.name().to_string())
        .collect();

    for name in &names {
        tracing::warn!(field = %name, "result depends on a set absent from the interface");
    }
    names.into_iter().collect()
}
