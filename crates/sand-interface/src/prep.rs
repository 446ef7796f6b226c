//! Data preparation workbooks
//!
//! A prep workbook carries parameter data prepared outside clicSAND, one
//! sheet per topic, each exported as `<sheet>.csv`. Sheets often have notes
//! above the table, so the header row is located by an anchor column name
//! rather than assumed to be the first line.
//!
//! Values are either in a `VALUE` column (`Time Independent Parameters` in
//! the workbook) or spread over one column per year.

use crate::clicsand::year_header;
use crate::csv_dir::{csv_files, parse_number, parse_year, VALUE};
use crate::error::{SourceError, SourceResult};
use crate::years::YEAR;
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

const TIME_INDEPENDENT: &str = "Time Independent Parameters";

/// One value read from a prep sheet, keyed in the caller's index order
#[derive(Debug, Clone, PartialEq)]
pub struct PrepValue {
    pub key: Vec<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PrepRow {
    line: usize,
    cells: Vec<String>,
}

/// Table of a prep sheet, below its header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepSheet {
    name: String,
    anchor: String,
    headers: Vec<String>,
    rows: Vec<PrepRow>,
}

impl PrepSheet {
    /// Parse CSV text, taking as header the row that contains `anchor`
    ///
    /// The first row wins if it contains `anchor`; otherwise the last row
    /// that does. Rows above the header and blank rows are dropped.
    ///
    /// # Errors
    /// Returns `SourceError::Csv` on malformed CSV and
    /// `SourceError::MalformedSheet` if no row contains `anchor`
    pub fn parse(name: impl Into<String>, content: &str, anchor: &str) -> SourceResult<Self> {
        let name = name.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SourceError::csv_error(&name, e))?;
            lines.push(record.iter().map(ToString::to_string).collect::<Vec<_>>());
        }

        let has_anchor = |cells: &Vec<String>| cells.iter().any(|c| c == anchor);
        let header_at = if lines.first().is_some_and(has_anchor) {
            0
        } else {
            lines.iter().rposition(has_anchor).ok_or_else(|| {
                SourceError::malformed(&name, format!("no header row containing `{anchor}`"))
            })?
        };

        let headers: Vec<String> = lines[header_at]
            .iter()
            .map(|h| if h == TIME_INDEPENDENT { VALUE.to_string() } else { h.clone() })
            .collect();
        let rows = lines
            .into_iter()
            .enumerate()
            .skip(header_at + 1)
            .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
            .map(|(i, mut cells)| {
                cells.resize(headers.len(), String::new());
                PrepRow { line: i + 1, cells }
            })
            .collect();

        tracing::debug!(sheet = %name, anchor, header_line = header_at + 1, "parsed prep sheet");
        Ok(Self {
            name,
            anchor: anchor.to_string(),
            headers,
            rows,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column used to locate the header row
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
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

    /// Position of `column`
    ///
    /// # Errors
    /// Returns `SourceError::MissingColumn` if the header lacks it
    pub fn column(&self, column: &str) -> SourceResult<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SourceError::missing_column(&self.name, column))
    }

    /// Distinct values of `column`, in first-seen order, blanks skipped
    ///
    /// # Errors
    /// Returns `SourceError::MissingColumn` if the header lacks `column`
    pub fn column_values(&self, column: &str) -> SourceResult<Vec<String>> {
        let at = self.column(column)?;
        let mut values: Vec<String> = Vec::new();
        for row in &self.rows {
            let cell = &row.cells[at];
            if !cell.is_empty() && !values.contains(cell) {
                values.push(cell.clone());
            }
        }
        Ok(values)
    }

    /// Rows whose `column` cell equals `value`
    ///
    /// # Errors
    /// Returns `SourceError::MissingColumn` if the header lacks `column`
    pub fn filter_eq(&self, column: &str, value: &str) -> SourceResult<Self> {
        let at = self.column(column)?;
        Ok(Self {
            rows: self
                .rows
                .iter()
                .filter(|row| row.cells[at] == value)
                .cloned()
                .collect(),
            ..self.clone_empty()
        })
    }

    /// Split rows into groups by their anchor cell, in first-seen order
    ///
    /// With `keep_anchor` false the anchor column is removed from each group,
    /// as when the anchor holds parameter names rather than set codes. Rows
    /// with a blank anchor cell belong to no group.
    #[must_use]
    pub fn break_down(&self, keep_anchor: bool) -> IndexMap<String, PrepSheet> {
        let Some(at) = self.headers.iter().position(|h| *h == self.anchor) else {
            return IndexMap::new();
        };

        let mut groups: IndexMap<String, PrepSheet> = IndexMap::new();
        for row in &self.rows {
            let category = &row.cells[at];
            if category.is_empty() {
                continue;
            }
            let group = groups.entry(category.clone()).or_insert_with(|| {
                let mut empty = self.clone_empty();
                if !keep_anchor {
                    empty.headers.remove(at);
                }
                empty
            });
            let mut row = row.clone();
            if !keep_anchor {
                row.cells.remove(at);
            }
            group.rows.push(row);
        }
        groups
    }

    /// Values keyed by `indices`, in that order
    ///
    /// When `indices` includes YEAR and the sheet has no YEAR column, every
    /// year column is read as one value per row and year. Otherwise values
    /// come from `VALUE`. Rows with a blank index cell and blank value cells
    /// are skipped.
    ///
    /// # Errors
    /// Returns `SourceError::MissingColumn` for an index or value column the
    /// sheet lacks and `SourceError::InvalidNumber` on a non-numeric value or
    /// year
    pub fn values(&self, indices: &[String]) -> SourceResult<Vec<PrepValue>> {
        let melt = indices.iter().any(|i| i == YEAR) && !self.headers.iter().any(|h| h == YEAR);

        let mut positions = Vec::with_capacity(indices.len());
        for index in indices {
            positions.push(if melt && index == YEAR {
                None
            } else {
                Some(self.column(index)?)
            });
        }

        let year_columns: Vec<(usize, i32)> = if melt {
            self.headers
                .iter()
                .enumerate()
                .filter_map(|(at, h)| year_header(h).map(|year| (at, year)))
                .collect()
        } else {
            Vec::new()
        };
        if melt && year_columns.is_empty() {
            return Err(SourceError::missing_column(&self.name, YEAR));
        }
        let value_at = if melt { None } else { Some(self.column(VALUE)?) };

        let mut values = Vec::new();
        for row in &self.rows {
            let mut key = Vec::with_capacity(indices.len());
            for (index, position) in indices.iter().zip(&positions) {
                match position {
                    Some(at) if index == YEAR => {
                        let cell = &row.cells[*at];
                        if cell.is_empty() {
                            key.push(String::new());
                        } else {
                            key.push(parse_year(&self.name, row.line, cell)?.to_string());
                        }
                    }
                    Some(at) => key.push(row.cells[*at].clone()),
                    None => key.push(String::new()),
                }
            }
            let blank_index = key
                .iter()
                .zip(&positions)
                .any(|(cell, position)| position.is_some() && cell.is_empty());
            if blank_index {
                tracing::debug!(sheet = %self.name, line = row.line, "skipping row with blank index cell");
                continue;
            }

            match value_at {
                Some(at) => {
                    let cell = &row.cells[at];
                    if !cell.is_empty() {
                        values.push(PrepValue {
                            key,
                            value: parse_number(&self.name, row.line, cell)?,
                        });
                    }
                }
                None => {
                    let year_at = positions.iter().position(Option::is_none);
                    for (at, year) in &year_columns {
                        let cell = &row.cells[*at];
                        if cell.is_empty() {
                            continue;
                        }
                        let mut key = key.clone();
                        if let Some(year_at) = year_at {
                            key[year_at] = year.to_string();
                        }
                        values.push(PrepValue {
                            key,
                            value: parse_number(&self.name, row.line, cell)?,
                        });
                    }
                }
            }
        }
        Ok(values)
    }

    fn clone_empty(&self) -> Self {
        Self {
            name: self.name.clone(),
            anchor: self.anchor.clone(),
            headers: self.headers.clone(),
            rows: Vec::new(),
        }
    }
}

/// Sheets of a prep workbook, kept as CSV text until a caller names the
/// anchor column to read them with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepWorkbook {
    sheets: IndexMap<String, String>,
}

impl PrepWorkbook {
    /// Read every `<sheet>.csv` in `dir`
    ///
    /// # Errors
    /// Returns `SourceError::Io` if the directory or a file cannot be read
    pub fn from_dir(dir: impl AsRef<Path>) -> SourceResult<Self> {
        let dir = dir.as_ref();
        let mut sheets = IndexMap::new();
        for path in csv_files(dir)? {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| SourceError::io_error(&path, e))?;
            sheets.insert(name.to_string(), content);
        }
        tracing::info!(dir = %dir.display(), sheets = sheets.len(), "loaded prep workbook");
        Ok(Self { sheets })
    }

    /// Workbook from in-memory CSV text
    pub fn from_sheets<N, C>(sheets: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            sheets: sheets
                .into_iter()
                .map(|(name, content)| (name.into(), content.into()))
                .collect(),
        }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Parse sheet `name` with `anchor` as header locator
    ///
    /// # Errors
    /// Returns `SourceError::MissingSheet` if there is no such sheet,
    /// otherwise as [`PrepSheet::parse`]
    pub fn sheet(&self, name: &str, anchor: &str) -> SourceResult<PrepSheet> {
        let content = self.sheets.get(name).ok_or_else(|| SourceError::MissingSheet {
            sheet: name.to_string(),
        })?;
        PrepSheet::parse(name, content, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TECH_SHEET: &str = "\
Data preparation for new technologies,,,,,
Source: national statistics,,,,,
,,,,,
ParameterID,REGION,TECHNOLOGY,Time Independent Parameters,2015,2016
CapitalCost,RE1,WIND,,1200,1100
CapitalCost,RE2,WIND,,1300,1250
CapacityToActivityUnit,RE1,WIND,31.536,,
";

    fn key(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn tech_sheet() -> PrepSheet {
        PrepSheet::parse("NewTech", TECH_SHEET, "ParameterID").unwrap()
    }

    #[test]
    fn header_row_is_found_below_notes() {
        let sheet = tech_sheet();
        assert_eq!(
            sheet.headers(),
            ["ParameterID", "REGION", "TECHNOLOGY", "VALUE", "2015", "2016"]
        );
        assert_eq!(sheet.len(), 3);
    }

    #[test]
    fn first_row_header_is_kept() {
        let sheet = PrepSheet::parse("Demand", "FUEL,REGION,VALUE\nELC,RE1,5\n", "FUEL").unwrap();
        assert_eq!(sheet.headers(), ["FUEL", "REGION", "VALUE"]);
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn missing_anchor_is_malformed() {
        let err = PrepSheet::parse("Demand", "FUEL,VALUE\nELC,5\n", "ParameterID").unwrap_err();
        assert!(matches!(err, SourceError::MalformedSheet { ref sheet, .. } if sheet == "Demand"));
    }

    #[test]
    fn break_down_groups_by_anchor() {
        let groups = tech_sheet().break_down(false);
        let names: Vec<_> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["CapitalCost", "CapacityToActivityUnit"]);

        let cost = &groups["CapitalCost"];
        assert_eq!(cost.len(), 2);
        assert!(cost.column("ParameterID").is_err());

        let kept = tech_sheet().break_down(true);
        assert!(kept["CapitalCost"].column("ParameterID").is_ok());
    }

    #[test]
    fn year_columns_are_melted_in_index_order() {
        let cost = tech_sheet().break_down(false).swap_remove("CapitalCost").unwrap();
        let rows = cost
            .filter_eq("REGION", "RE1")
            .unwrap()
            .values(&key(&["REGION", "TECHNOLOGY", "YEAR"]))
            .unwrap();
        assert_eq!(
            rows,
            vec![
                PrepValue { key: key(&["RE1", "WIND", "2015"]), value: 1200.0 },
                PrepValue { key: key(&["RE1", "WIND", "2016"]), value: 1100.0 },
            ]
        );

        let reversed = cost.values(&key(&["YEAR", "TECHNOLOGY", "REGION"])).unwrap();
        assert_eq!(reversed[0].key, key(&["2015", "WIND", "RE1"]));
        assert_eq!(reversed.len(), 4);
    }

    #[test]
    fn scalar_values_come_from_value_column() {
        let unit = tech_sheet()
            .break_down(false)
            .swap_remove("CapacityToActivityUnit")
            .unwrap();
        let rows = unit.values(&key(&["REGION", "TECHNOLOGY"])).unwrap();
        assert_eq!(rows, vec![PrepValue { key: key(&["RE1", "WIND"]), value: 31.536 }]);
    }

    #[test]
    fn missing_index_column_is_reported() {
        let err = tech_sheet().values(&key(&["REGION", "FUEL"])).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "FUEL"));
    }

    #[test]
    fn invalid_value_names_line() {
        let sheet = PrepSheet::parse("Demand", "note\nFUEL,VALUE\nELC,lots\n", "FUEL").unwrap();
        let err = sheet.values(&key(&["FUEL"])).unwrap_err();
        assert!(matches!(err, SourceError::InvalidNumber { row: 3, .. }));
    }

    #[test]
    fn column_values_are_distinct() {
        assert_eq!(tech_sheet().column_values("REGION").unwrap(), key(&["RE1", "RE2"]));
    }

    #[test]
    fn workbook_reads_sheets_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("NewTech.csv"), TECH_SHEET).unwrap();
        fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let workbook = PrepWorkbook::from_dir(dir.path()).unwrap();
        assert_eq!(workbook.sheet_names().collect::<Vec<_>>(), vec!["NewTech"]);
        assert_eq!(workbook.sheet("NewTech", "ParameterID").unwrap(), tech_sheet());
        assert!(matches!(
            workbook.sheet("Demand", "FUEL"),
            Err(SourceError::MissingSheet { .. })
        ));
    }
}
