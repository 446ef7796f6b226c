//! Parameter tables
//!
//! A [`ParamTable`] holds the numeric values of one parameter, keyed by the
//! tuple of index values in the order of its declared indices.

use crate::error::{SourceError, SourceResult};
use indexmap::{IndexMap, IndexSet};

/// Values of a parameter keyed by index tuple
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamTable {
    name: String,
    indices: Vec<String>,
    rows: IndexMap<Vec<String>, f64>,
}

impl ParamTable {
    pub fn new(name: impl Into<String>, indices: Vec<String>) -> Self {
        Self {
            name: name.into(),
            indices,
            rows: IndexMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// Record a value; a repeated key replaces the earlier value
    ///
    /// # Errors
    /// Returns `SourceError::KeyArity` if the key length differs from the
    /// number of indices
    pub fn insert(&mut self, key: Vec<String>, value: f64) -> SourceResult<()> {
        if key.len() != self.indices.len() {
            return Err(SourceError::KeyArity {
                field: self.name.clone(),
                expected: self.indices.len(),
                actual: key.len(),
            });
        }
        if let Some(previous) = self.rows.insert(key, value) {
            tracing::debug!(field = %self.name, previous, value, "duplicate key overwritten");
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &[String]) -> Option<f64> {
        self.rows.get(key).copied()
    }

    /// Iterate over rows in insertion order
    pub fn rows(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.rows.iter().map(|(key, value)| (key.as_slice(), *value))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique values used for one index, in first-seen order
    ///
    /// Returns an empty list if the table is not indexed over `index`.
    #[must_use]
    pub fn index_values(&self, index: &str) -> Vec<String> {
        let Some(position) = self.indices.iter().position(|i| i == index) else {
            return Vec::new();
        };
        self.rows
            .keys()
            .map(|key| key[position].clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn capital_cost() -> ParamTable {
        let mut table = ParamTable::new("CapitalCost", key(&["REGION", "TECHNOLOGY", "YEAR"]));
        table.insert(key(&["RE1", "COAL", "2015"]), 1500.0).unwrap();
        table.insert(key(&["RE1", "GAS", "2015"]), 900.0).unwrap();
        table.insert(key(&["RE1", "COAL", "2016"]), 1450.0).unwrap();
        table
    }

    #[test]
    fn get_returns_inserted_value() {
        let table = capital_cost();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&key(&["RE1", "GAS", "2015"])), Some(900.0));
        assert_eq!(table.get(&key(&["RE1", "GAS", "2016"])), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut table = capital_cost();
        let err = table.insert(key(&["RE1", "COAL"]), 1.0).unwrap_err();
        assert!(matches!(
            err,
            SourceError::KeyArity {
                expected: 3,
                actual: 2,
                ..
            }
        ));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn repeated_key_replaces_value() {
        let mut table = capital_cost();
        table.insert(key(&["RE1", "COAL", "2015"]), 1600.0).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&key(&["RE1", "COAL", "2015"])), Some(1600.0));
    }

    #[test]
    fn index_values_are_unique_in_first_seen_order() {
        let table = capital_cost();
        assert_eq!(table.index_values("TECHNOLOGY"), key(&["COAL", "GAS"]));
        assert_eq!(table.index_values("YEAR"), key(&["2015", "2016"]));
        assert!(table.index_values("FUEL").is_empty());
    }

    #[test]
    fn scalar_table_has_single_empty_key() {
        let mut table = ParamTable::new("DiscountRate", Vec::new());
        table.insert(Vec::new(), 0.05).unwrap();
        assert_eq!(table.get(&[]), Some(0.05));
    }
}
