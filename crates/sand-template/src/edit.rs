//! Edits on a populated template
//!
//! Code renames, and merges of data preparation sheets. A merge only sets
//! values of rows the template already has: prep values keyed outside the
//! template's domains are counted as unmatched and left out.

use crate::error::{TemplateError, TemplateResult};
use crate::populate::{FieldValues, PopulatedTemplate, Row};
use sand_interface::{PrepSheet, PrepValue};
use std::collections::HashMap;
use std::ops::AddAssign;

const REGION: &str = "REGION";
const TECHNOLOGY: &str = "TECHNOLOGY";
const FUEL: &str = "FUEL";

/// Rename element `old` of `set` to `new`
///
/// The set's own values and the matching key position of every parameter
/// indexed over `set` are updated. Returns the number of cells changed.
///
/// # Errors
/// Returns `TemplateError::UnknownField` if the template has no field named
/// `set`, and `TemplateError::NotASet` if that field is a parameter
pub fn replace_set_code(
    template: &mut PopulatedTemplate,
    set: &str,
    old: &str,
    new: &str,
) -> TemplateResult<usize> {
    let field = template
        .field_mut(set)
        .ok_or_else(|| TemplateError::UnknownField(set.to_string()))?;
    let FieldValues::Set(values) = field.values_mut() else {
        return Err(TemplateError::NotASet(set.to_string()));
    };

    if old != new && values.iter().any(|v| v == new) {
        tracing::warn!(set, code = new, "renamed code already present in set");
    }
    let mut changed = rename(values.iter_mut(), old, new);

    for field in template.fields_mut() {
        let FieldValues::Param { indices, rows } = field.values_mut() else {
            continue;
        };
        let Some(position) = indices.iter().position(|i| i == set) else {
            continue;
        };
        changed += rename(rows.iter_mut().map(|row| &mut row.key[position]), old, new);
    }

    tracing::debug!(set, old, new, changed, "replaced set code");
    Ok(changed)
}

fn rename<'a>(cells: impl Iterator<Item = &'a mut String>, old: &str, new: &str) -> usize {
    let mut changed = 0;
    for cell in cells.filter(|c| c.as_str() == old) {
        new.clone_into(cell);
        changed += 1;
    }
    changed
}

/// Outcome of merging prep values into a template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Template cells whose value was set
    pub updated: usize,
    /// Prep values with no matching template row
    pub unmatched: usize,
}

impl AddAssign for MergeSummary {
    fn add_assign(&mut self, other: Self) {
        self.updated += other.updated;
        self.unmatched += other.unmatched;
    }
}

/// Parameterize technology `tech` in `region`
///
/// `sheet` is anchored on a parameter-name column; each group of rows fills
/// the parameter it names, restricted to `tech` and `region`.
///
/// # Errors
/// Returns `TemplateError::UnknownField` for a parameter the template lacks,
/// `TemplateError::MissingIndex` if one is not indexed over REGION and
/// TECHNOLOGY, and `TemplateError::Source` if the sheet lacks a needed column
pub fn add_tech(
    template: &mut PopulatedTemplate,
    sheet: &PrepSheet,
    tech: &str,
    region: &str,
) -> TemplateResult<MergeSummary> {
    let mut summary = MergeSummary::default();
    for (param, group) in sheet.break_down(false) {
        require_index(template, &param, REGION)?;
        require_index(template, &param, TECHNOLOGY)?;
        let selected = group.filter_eq(REGION, region)?.filter_eq(TECHNOLOGY, tech)?;
        summary += merge(template, &param, &selected)?;
    }
    tracing::info!(tech, region, updated = summary.updated, "added technology data");
    Ok(summary)
}

/// Fill a fuel parameter that does not depend on technology, such as
/// `SpecifiedAnnualDemand` or `AccumulatedAnnualDemand`
///
/// # Errors
/// Returns `TemplateError::UnexpectedIndex` if `param` is indexed over
/// TECHNOLOGY, `TemplateError::MissingIndex` if it lacks FUEL or REGION, and
/// otherwise as [`add_tech`]
pub fn add_fuel_param(
    template: &mut PopulatedTemplate,
    sheet: &PrepSheet,
    param: &str,
    fuel: &str,
    region: &str,
) -> TemplateResult<MergeSummary> {
    if param_indices(template, param)?.iter().any(|i| i == TECHNOLOGY) {
        return Err(TemplateError::UnexpectedIndex {
            field: param.to_string(),
            index: TECHNOLOGY.to_string(),
        });
    }
    require_index(template, param, FUEL)?;
    require_index(template, param, REGION)?;

    let selected = sheet.filter_eq(FUEL, fuel)?.filter_eq(REGION, region)?;
    merge(template, param, &selected)
}

/// Fill `param` from a sheet with one row per `set` code in `region`
///
/// # Errors
/// Returns `TemplateError::MissingIndex` if `param` is not indexed over
/// `set` and REGION, and otherwise as [`add_tech`]
pub fn add_single_param(
    template: &mut PopulatedTemplate,
    sheet: &PrepSheet,
    param: &str,
    set: &str,
    region: &str,
) -> TemplateResult<MergeSummary> {
    require_index(template, param, set)?;
    require_index(template, param, REGION)?;

    let selected = sheet.filter_eq(REGION, region)?;
    merge(template, param, &selected)
}

/// Fill `param` category by category, the sheet's anchor column naming the
/// category and `set` the codes within it
///
/// # Errors
/// Returns `TemplateError::MissingIndex` if `param` is not indexed over the
/// anchor, `set` and REGION, and otherwise as [`add_tech`]
pub fn add_segregable_param(
    template: &mut PopulatedTemplate,
    sheet: &PrepSheet,
    param: &str,
    set: &str,
    region: &str,
) -> TemplateResult<MergeSummary> {
    require_index(template, param, sheet.anchor())?;
    require_index(template, param, set)?;
    require_index(template, param, REGION)?;

    let mut summary = MergeSummary::default();
    for (category, group) in sheet.break_down(true) {
        let selected = group.filter_eq(REGION, region)?;
        let codes = selected.column_values(set)?;
        tracing::debug!(param, category = %category, codes = codes.len(), "merging category");
        summary += merge(template, param, &selected)?;
    }
    Ok(summary)
}

/// Associate emission flows with technologies: [`add_segregable_param`]
/// with a sheet anchored on a set of the template, usually EMISSION
///
/// # Errors
/// Returns `TemplateError::UnknownField` if the anchor is not a template
/// field, `TemplateError::NotASet` if it is a parameter, and otherwise as
/// [`add_segregable_param`]
pub fn add_emission_param(
    template: &mut PopulatedTemplate,
    sheet: &PrepSheet,
    param: &str,
    set: &str,
    region: &str,
) -> TemplateResult<MergeSummary> {
    let anchor = sheet.anchor();
    let field = template
        .field(anchor)
        .ok_or_else(|| TemplateError::UnknownField(anchor.to_string()))?;
    if !matches!(field.values(), FieldValues::Set(_)) {
        return Err(TemplateError::NotASet(anchor.to_string()));
    }
    add_segregable_param(template, sheet, param, set, region)
}

fn param_indices<'a>(template: &'a PopulatedTemplate, param: &str) -> TemplateResult<&'a [String]> {
    let field = template
        .field(param)
        .ok_or_else(|| TemplateError::UnknownField(param.to_string()))?;
    match field.values() {
        FieldValues::Param { indices, .. } => Ok(indices.as_slice()),
        FieldValues::Set(_) => Err(TemplateError::NotAParam(param.to_string())),
    }
}

fn require_index(template: &PopulatedTemplate, param: &str, index: &str) -> TemplateResult<()> {
    if param_indices(template, param)?.iter().any(|i| i == index) {
        Ok(())
    } else {
        Err(TemplateError::MissingIndex {
            field: param.to_string(),
            index: index.to_string(),
        })
    }
}

fn merge(template: &mut PopulatedTemplate, param: &str, sheet: &PrepSheet) -> TemplateResult<MergeSummary> {
    let field = template
        .field_mut(param)
        .ok_or_else(|| TemplateError::UnknownField(param.to_string()))?;
    let FieldValues::Param { indices, rows } = field.values_mut() else {
        return Err(TemplateError::NotAParam(param.to_string()));
    };

    let values = sheet.values(indices.as_slice())?;
    let positions: HashMap<Vec<String>, usize> = rows
        .iter()
        .enumerate()
        .map(|(at, row)| (row.key.clone(), at))
        .collect();

    let mut summary = MergeSummary::default();
    for PrepValue { key, value } in values {
        match positions.get(&key) {
            Some(at) => {
                let row: &mut Row = &mut rows[*at];
                row.value = Some(value);
                summary.updated += 1;
            }
            None => summary.unmatched += 1,
        }
    }

    if summary.unmatched > 0 {
        tracing::warn!(
            param,
            sheet = sheet.name(),
            unmatched = summary.unmatched,
            "prep values outside the template domains"
        );
    }
    tracing::debug!(param, sheet = sheet.name(), updated = summary.updated, "merged prep values");
    Ok(summary)
}
