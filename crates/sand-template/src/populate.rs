//! Template population
//!
//! Copies source values into the target layout. A parameter gets one row per
//! combination of its index domains, first index varying slowest; rows the
//! source has no value for stay blank. Source tables may list the same
//! indices in another order; their keys are matched by index name.

use crate::error::{FieldShapeMismatch, TemplateError, TemplateResult};
use crate::template::{TargetTemplate, TemplateField};
use indexmap::IndexMap;
use sand_interface::SourceInterface;
use sand_schema::FieldKind;

/// How a template field was filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// Values copied from the source
    Populated,
    /// Field absent from the source; left empty
    Blank,
    /// Source shape differs from the template; left empty
    Mismatched,
}

/// One parameter row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Vec<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Set(Vec<String>),
    Param { indices: Vec<String>, rows: Vec<Row> },
}

impl FieldValues {
    fn empty(field: &TemplateField) -> Self {
        match field.kind() {
            FieldKind::Param => Self::Param {
                indices: field.indices().to_vec(),
                rows: Vec::new(),
            },
            FieldKind::Set | FieldKind::Result => Self::Set(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedField {
    name: String,
    short_name: Option<String>,
    status: FieldStatus,
    values: FieldValues,
}

impl PopulatedField {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> FieldStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut FieldValues {
        &mut self.values
    }

    /// Set elements, or parameter rows holding a value
    #[must_use]
    pub fn populated_cells(&self) -> usize {
        match &self.values {
            FieldValues::Set(values) => values.len(),
            FieldValues::Param { rows, .. } => rows.iter().filter(|r| r.value.is_some()).count(),
        }
    }
}

/// Template filled with source data, in template order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulatedTemplate {
    fields: IndexMap<String, PopulatedField>,
}

impl PopulatedTemplate {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&PopulatedField> {
        self.fields.get(name)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut PopulatedField> {
        self.fields.get_mut(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &PopulatedField> {
        self.fields.values()
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut PopulatedField> {
        self.fields.values_mut()
    }

    /// Names of fields the source did not provide
    pub fn blank_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter(|f| f.status == FieldStatus::Blank)
            .map(PopulatedField::name)
    }

    #[must_use]
    pub fn populated_cells(&self) -> usize {
        self.fields.values().map(PopulatedField::populated_cells).sum()
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

/// Outcome of [`populate`]
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateReport {
    pub template: PopulatedTemplate,
    pub mismatches: Vec<FieldShapeMismatch>,
}

impl PopulateReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Fail if any field was mismatched
    ///
    /// # Errors
    /// Returns `TemplateError::ShapeMismatches` listing every mismatch
    pub fn into_result(self) -> TemplateResult<PopulatedTemplate> {
        if self.mismatches.is_empty() {
            Ok(self.template)
        } else {
            Err(TemplateError::ShapeMismatches(self.mismatches))
        }
    }
}

/// Fill `template` from `source`
///
/// Fields absent from the source are left blank. A field whose kind differs
/// from the source's, or whose indices are not the same names in any order,
/// is recorded as a mismatch and left empty; the remaining fields are still
/// processed.
#[must_use]
pub fn populate(template: &TargetTemplate, source: &SourceInterface) -> PopulateReport {
    let mut fields = IndexMap::with_capacity(template.len());
    let mut mismatches = Vec::new();

    for field in template.fields() {
        let (status, values) = match source.field_set().get(field.name()) {
            None => (FieldStatus::Blank, FieldValues::empty(field)),
            Some(found)
                if found.kind() != field.kind() || !same_indices(found.indices(), field.indices()) =>
            {
                mismatches.push(FieldShapeMismatch {
                    field: field.name().to_string(),
                    expected_kind: field.kind(),
                    expected_indices: field.indices().to_vec(),
                    found_kind: found.kind(),
                    found_indices: found.indices().to_vec(),
                });
                (FieldStatus::Mismatched, FieldValues::empty(field))
            }
            Some(_) => (FieldStatus::Populated, fill(field, source)),
        };

        fields.insert(
            field.name().to_string(),
            PopulatedField {
                name: field.name().to_string(),
                short_name: field.short_name().map(str::to_string),
                status,
                values,
            },
        );
    }

    let template = PopulatedTemplate { fields };
    for mismatch in &mismatches {
        tracing::warn!(%mismatch, "field not populated");
    }
    tracing::info!(
        fields = template.len(),
        cells = template.populated_cells(),
        blank = template.blank_fields().count(),
        mismatched = mismatches.len(),
        "populated template"
    );
    PopulateReport {
        template,
        mismatches,
    }
}

/// Same index names, regardless of order
fn same_indices(found: &[String], expected: &[String]) -> bool {
    let mut found: Vec<&String> = found.iter().collect();
    let mut expected: Vec<&String> = expected.iter().collect();
    found.sort_unstable();
    expected.sort_unstable();
    found == expected
}

/// For each source index, its position in the template's index list
fn key_order(source: &[String], template: &[String]) -> Vec<usize> {
    let mut taken = vec![false; template.len()];
    source
        .iter()
        .filter_map(|index| {
            let at = template
                .iter()
                .enumerate()
                .position(|(i, t)| !taken[i] && t == index)?;
            taken[at] = true;
            Some(at)
        })
        .collect()
}

fn fill(field: &TemplateField, source: &SourceInterface) -> FieldValues {
    if field.kind() != FieldKind::Param {
        let values = source.set_values(field.name()).unwrap_or_default().to_vec();
        return FieldValues::Set(values);
    }

    let domains: Vec<&[String]> = field
        .indices()
        .iter()
        .map(|index| match source.domain(index) {
            Some(domain) => domain,
            None => {
                tracing::warn!(field = field.name(), index = %index, "no domain for index");
                &[]
            }
        })
        .collect();

    let table = source.table(field.name());
    let order = table
        .map(|t| key_order(t.indices(), field.indices()))
        .filter(|order| order.iter().enumerate().any(|(i, at)| i != *at));
    if order.is_some() {
        tracing::debug!(field = field.name(), "source indices reordered to template order");
    }

    let rows = cartesian_product(&domains)
        .into_iter()
        .map(|key| {
            let value = table.and_then(|t| match &order {
                Some(order) => t.get(&order.iter().map(|at| key[*at].clone()).collect::<Vec<_>>()),
                None => t.get(&key),
            });
            Row { key, value }
        })
        .collect();

    FieldValues::Param {
        indices: field.indices().to_vec(),
        rows,
    }
}

/// Every combination of one value per domain, first domain varying slowest
///
/// No domains yield a single empty combination; any empty domain yields none.
pub(crate) fn cartesian_product(domains: &[&[String]]) -> Vec<Vec<String>> {
    let mut combos: Vec<Vec<String>> = vec![Vec::with_capacity(domains.len())];
    for domain in domains {
        let mut next = Vec::with_capacity(combos.len() * domain.len());
        for prefix in &combos {
            for value in *domain {
                let mut combo = prefix.clone();
                combo.push(value.clone());
                next.push(combo);
            }
        }
        combos = next;
    }
    combos
}
