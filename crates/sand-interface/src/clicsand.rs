//! clicSAND workbook reader
//!
//! Reads the CSV exports of the two clicSAND sheets that carry model data:
//!
//! - `SETS`: element codes in the `Technologies`, `Commodities` and
//!   `Emissions` columns. The `Emissions` column also lists the regions,
//!   after a `Region` marker and up to the `ResultsPath` cell.
//! - `Parameters`: one row per parameter and index combination, a
//!   `Time indipendent variables` column for scalar values and one column
//!   per year.
//!
//! Sets that appear as `Parameters` columns without a `SETS` column
//! (`MODE_OF_OPERATION`, `TIMESLICE`, `STORAGE`, ...) are implicit; their
//! domain is the sorted set of values the parameters use, ordered by the
//! set's schema `dtype` when one is declared.

use crate::csv_dir::{parse_number, VALUE};
use crate::error::{SourceError, SourceResult};
use crate::interface::SourceInterface;
use crate::table::ParamTable;
use crate::years::{YearRange, YEAR};
use csv::StringRecord;
use indexmap::{IndexMap, IndexSet};
use sand_schema::{DType, FieldKind, SchemaDocument};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

pub const SETS_SHEET: &str = "SETS";
pub const PARAMETERS_SHEET: &str = "Parameters";

const PARAMETER: &str = "Parameter";
const TIME_INDEPENDENT: &str = "Time indipendent variables";
const REGION: &str = "REGION";
const REGION2: &str = "REGION2";
const REGIONR: &str = "REGIONR";

const TECHNOLOGIES: &str = "Technologies";
const COMMODITIES: &str = "Commodities";
const EMISSIONS: &str = "Emissions";
const HEADER_CELL: &str = "Code";
const REGION_MARKER: &str = "Region";
const RESULTS_MARKER: &str = "ResultsPath";

/// Reader for clicSAND `SETS` and `Parameters` sheet exports
#[derive(Debug, Clone, Default)]
pub struct ClicSandReader {
    years: YearRange,
    dtypes: IndexMap<String, DType>,
}

impl ClicSandReader {
    #[must_use]
    pub fn new(years: YearRange) -> Self {
        Self {
            years,
            dtypes: IndexMap::new(),
        }
    }

    /// Order implicit set domains by the `dtype` each set declares in `schema`
    #[must_use]
    pub fn with_schema(mut self, schema: &SchemaDocument) -> Self {
        self.dtypes = schema
            .fields()
            .filter(|field| field.kind() == FieldKind::Set)
            .filter_map(|field| field.dtype().map(|dtype| (field.name().to_string(), dtype)))
            .collect();
        self
    }

    /// Read both sheets from CSV files
    ///
    /// # Errors
    /// Returns `SourceError::Io` if a file cannot be read, otherwise as
    /// [`read_str`](Self::read_str)
    pub fn read_files(
        &self,
        sets: impl AsRef<Path>,
        parameters: impl AsRef<Path>,
    ) -> SourceResult<SourceInterface> {
        let sets = sets.as_ref();
        let parameters = parameters.as_ref();
        let sets_csv = fs::read_to_string(sets).map_err(|e| SourceError::io_error(sets, e))?;
        let params_csv =
            fs::read_to_string(parameters).map_err(|e| SourceError::io_error(parameters, e))?;
        self.read_str(&sets_csv, &params_csv)
    }

    /// Read both sheets from CSV text
    ///
    /// # Errors
    /// Returns `SourceError::MissingColumn` if a required column is absent,
    /// `SourceError::MalformedSheet` if the region list cannot be located and
    /// `SourceError::InvalidNumber` on a non-numeric value
    pub fn read_str(&self, sets_csv: &str, params_csv: &str) -> SourceResult<SourceInterface> {
        let sets = SetsSheet::parse(sets_csv)?;
        let params = ParametersSheet::parse(params_csv, self.years)?;

        let explicit = sets.domains();
        let mut builder = SourceInterface::builder(self.years);

        for column in &params.set_columns {
            let domain = match column.as_str() {
                REGIONR => explicit.get(REGION).cloned().unwrap_or_default(),
                name => match explicit.get(name) {
                    Some(values) => values.clone(),
                    None => params.implicit_domain(name, self.dtypes.get(name).copied()),
                },
            };
            builder = builder.set(column, domain);
        }
        for (name, values) in &explicit {
            if !params.set_columns.iter().any(|c| c == name) {
                builder = builder.domain(name, values.iter().cloned());
            }
        }
        for table in params.tables {
            builder = builder.param(table);
        }

        let source = builder.build();
        tracing::info!(
            fields = source.field_set().len(),
            technologies = sets.technologies.len(),
            regions = sets.regions.len(),
            "read clicSAND sheets"
        );
        Ok(source)
    }
}

#[derive(Debug, Default)]
struct SetsSheet {
    technologies: Vec<String>,
    commodities: Vec<String>,
    emissions: Vec<String>,
    regions: Vec<String>,
}

impl SetsSheet {
    fn parse(content: &str) -> SourceResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| SourceError::csv_error(SETS_SHEET, e))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SourceError::missing_column(SETS_SHEET, name))
        };
        let tech_at = column(TECHNOLOGIES)?;
        let fuel_at = column(COMMODITIES)?;
        let emission_at = column(EMISSIONS)?;

        let mut technologies = Vec::new();
        let mut commodities = Vec::new();
        let mut emission_cells = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SourceError::csv_error(SETS_SHEET, e))?;
            push_code(&mut technologies, &record, tech_at);
            push_code(&mut commodities, &record, fuel_at);
            push_code(&mut emission_cells, &record, emission_at);
        }

        let (emissions, regions) = split_emission_region(emission_cells)?;
        Ok(Self {
            technologies,
            commodities,
            emissions,
            regions,
        })
    }

    fn domains(&self) -> IndexMap<&'static str, Vec<String>> {
        IndexMap::from([
            ("TECHNOLOGY", self.technologies.clone()),
            ("FUEL", self.commodities.clone()),
            ("EMISSION", self.emissions.clone()),
            (REGION, self.regions.clone()),
        ])
    }
}

fn push_code(codes: &mut Vec<String>, record: &StringRecord, at: usize) {
    match record.get(at) {
        Some(cell) if !cell.is_empty() && cell != HEADER_CELL => codes.push(cell.to_string()),
        _ => {}
    }
}

/// Emissions come first, then the `Region` marker, then regions up to the
/// cell mentioning `ResultsPath`
fn split_emission_region(cells: Vec<String>) -> SourceResult<(Vec<String>, Vec<String>)> {
    let marker = cells
        .iter()
        .rposition(|c| c == REGION_MARKER)
        .ok_or_else(|| SourceError::malformed(SETS_SHEET, "no `Region` marker in Emissions column"))?;
    let end = cells
        .iter()
        .rposition(|c| c.contains(RESULTS_MARKER))
        .filter(|end| *end > marker)
        .ok_or_else(|| {
            SourceError::malformed(SETS_SHEET, "no `ResultsPath` cell after the region list")
        })?;

    let regions = cells[marker + 1..end].to_vec();
    let mut emissions = cells;
    emissions.truncate(marker);
    Ok((emissions, regions))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Parameter,
    Set,
    Value,
    Year(i32),
    Ignored,
}

#[derive(Debug)]
struct ParametersSheet {
    set_columns: Vec<String>,
    tables: Vec<ParamTable>,
}

impl ParametersSheet {
    fn parse(content: &str, years: YearRange) -> SourceResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SourceError::csv_error(PARAMETERS_SHEET, e))?
            .iter()
            .map(|h| match h {
                TIME_INDEPENDENT => VALUE.to_string(),
                REGION2 => REGIONR.to_string(),
                other => other.to_string(),
            })
            .collect();

        let columns = classify_columns(&headers, years)?;
        let set_columns: Vec<usize> = (0..headers.len())
            .filter(|i| columns[*i] == Column::Set)
            .collect();

        let mut grouped: IndexMap<String, Vec<(usize, StringRecord)>> = IndexMap::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| SourceError::csv_error(PARAMETERS_SHEET, e))?;
            let Some(name) = columns
                .iter()
                .position(|c| *c == Column::Parameter)
                .and_then(|at| record.get(at))
                .filter(|name| !name.is_empty())
            else {
                continue;
            };
            grouped
                .entry(name.to_string())
                .or_default()
                .push((row + 2, record));
        }

        let mut tables = Vec::with_capacity(grouped.len());
        for (name, rows) in &grouped {
            tables.push(build_table(name, rows, &headers, &columns, &set_columns)?);
        }

        tracing::debug!(
            parameters = tables.len(),
            set_columns = set_columns.len(),
            "read Parameters sheet"
        );
        Ok(Self {
            set_columns: set_columns.iter().map(|i| headers[*i].clone()).collect(),
            tables,
        })
    }

    /// Sorted unique values of `set` across the parameters indexed over it
    fn implicit_domain(&self, set: &str, dtype: Option<DType>) -> Vec<String> {
        let values: IndexSet<String> = self
            .tables
            .iter()
            .flat_map(|table| table.index_values(set))
            .collect();
        sort_domain(set, values.into_iter().collect(), dtype)
    }
}

/// Columns before the first year are sets, except `Parameter` and `VALUE`
fn classify_columns(headers: &[String], years: YearRange) -> SourceResult<Vec<Column>> {
    if !headers.iter().any(|h| h == PARAMETER) {
        return Err(SourceError::missing_column(PARAMETERS_SHEET, PARAMETER));
    }

    let mut seen_year = false;
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers {
        let column = if header == PARAMETER {
            Column::Parameter
        } else if header == VALUE {
            Column::Value
        } else if let Some(year) = year_header(header) {
            seen_year = true;
            if years.contains(year) {
                Column::Year(year)
            } else {
                tracing::warn!(year, "ignoring year column outside the model horizon");
                Column::Ignored
            }
        } else if seen_year || header.is_empty() {
            Column::Ignored
        } else {
            Column::Set
        };
        columns.push(column);
    }
    Ok(columns)
}

pub(crate) fn year_header(header: &str) -> Option<i32> {
    if header.is_empty() || !header.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    header.parse().ok()
}

/// A parameter is indexed over the set columns it fills in any row, plus
/// YEAR when any year cell is filled
fn build_table(
    name: &str,
    rows: &[(usize, StringRecord)],
    headers: &[String],
    columns: &[Column],
    set_columns: &[usize],
) -> SourceResult<ParamTable> {
    let filled = |at: usize| rows.iter().any(|(_, r)| r.get(at).is_some_and(|c| !c.is_empty()));

    let used_sets: Vec<usize> = set_columns.iter().copied().filter(|at| filled(*at)).collect();
    let year_columns: Vec<(usize, i32)> = columns
        .iter()
        .enumerate()
        .filter_map(|(at, c)| match c {
            Column::Year(year) => Some((at, *year)),
            _ => None,
        })
        .collect();
    let has_years = year_columns.iter().any(|(at, _)| filled(*at));
    let value_at = columns.iter().position(|c| *c == Column::Value);

    let mut indices: Vec<String> = used_sets.iter().map(|at| headers[*at].clone()).collect();
    if has_years {
        indices.push(YEAR.to_string());
    }
    let mut table = ParamTable::new(name, indices);

    for (line, record) in rows {
        let prefix: Vec<String> = used_sets
            .iter()
            .map(|at| record.get(*at).unwrap_or_default().to_string())
            .collect();
        if prefix.iter().any(String::is_empty) {
            tracing::debug!(parameter = name, line, "skipping row with blank index cell");
            continue;
        }

        if has_years {
            for (at, year) in &year_columns {
                let Some(cell) = record.get(*at).filter(|c| !c.is_empty()) else {
                    continue;
                };
                let mut key = prefix.clone();
                key.push(year.to_string());
                table.insert(key, parse_number(name, *line, cell)?)?;
            }
        } else if let Some(cell) = value_at
            .and_then(|at| record.get(at))
            .filter(|c| !c.is_empty())
        {
            table.insert(prefix, parse_number(name, *line, cell)?)?;
        }
    }
    Ok(table)
}

/// Order a domain by the set's dtype
///
/// Without a dtype the order is numeric when every element is an integer and
/// text order otherwise. With a numeric dtype, elements that do not parse
/// sort after the numbers, in text order.
fn sort_domain(set: &str, mut values: Vec<String>, dtype: Option<DType>) -> Vec<String> {
    let dtype = dtype.unwrap_or_else(|| {
        if values.iter().all(|v| v.parse::<i64>().is_ok()) {
            DType::Int
        } else {
            DType::Str
        }
    });

    match dtype {
        DType::Str => values.sort(),
        DType::Int => values.sort_by(|a, b| numeric_order(a.parse::<i64>().ok(), b.parse().ok(), a, b)),
        DType::Float => values.sort_by(|a, b| numeric_order(a.parse::<f64>().ok(), b.parse().ok(), a, b)),
    }

    let invalid = match dtype {
        DType::Str => 0,
        DType::Int => values.iter().filter(|v| v.parse::<i64>().is_err()).count(),
        DType::Float => values.iter().filter(|v| v.parse::<f64>().is_err()).count(),
    };
    if invalid > 0 {
        tracing::warn!(set, dtype = dtype.as_str(), invalid, "set values do not match dtype");
    }
    values
}

fn numeric_order<T: PartialOrd>(a: Option<T>, b: Option<T>, a_text: &str, b_text: &str) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a_text.cmp(b_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETS: &str = "\
Technologies,Commodities,Emissions
Code,Code,Code
COAL,ELC,CO2
GAS,HEAT,
,,Region
,,RE1
,,ResultsPath: C:\\results
";

    const PARAMETERS: &str = "\
Parameter,REGION,REGION2,TECHNOLOGY,FUEL,MODE_OF_OPERATION,Time indipendent variables,2015,2016,1990
CapacityToActivityUnit,RE1,,COAL,,,31.536,,,
CapacityToActivityUnit,RE1,,GAS,,,31.536,,,
InputActivityRatio,RE1,,GAS,HEAT,2,,1.1,1.2,
InputActivityRatio,RE1,,GAS,HEAT,10,,1.3,,
DiscountRate,RE1,,,,,0.05,,,
";

    fn read() -> SourceInterface {
        ClicSandReader::new(YearRange::new(2015, 2016).unwrap())
            .read_str(SETS, PARAMETERS)
            .unwrap()
    }

    fn key(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn sets_sheet_codes_and_regions() {
        let source = read();
        assert_eq!(source.set_values("TECHNOLOGY").unwrap(), ["COAL", "GAS"]);
        assert_eq!(source.set_values("REGION").unwrap(), ["RE1"]);
        assert_eq!(source.set_values("FUEL").unwrap(), ["ELC", "HEAT"]);
    }

    #[test]
    fn emission_without_column_is_domain_only() {
        let source = read();
        assert!(!source.contains("EMISSION"));
        assert_eq!(source.domain("EMISSION").unwrap(), ["CO2"]);
    }

    #[test]
    fn field_set_matches_sheet_columns() {
        let source = read();
        let names: Vec<_> = source.field_set().names().collect();
        assert_eq!(
            names,
            vec![
                "REGION",
                "REGIONR",
                "TECHNOLOGY",
                "FUEL",
                "MODE_OF_OPERATION",
                "CapacityToActivityUnit",
                "InputActivityRatio",
                "DiscountRate",
                "YEAR",
            ]
        );
        assert_eq!(source.domain("REGIONR").unwrap(), ["RE1"]);
    }

    #[test]
    fn time_independent_values_become_scalar_rows() {
        let source = read();
        let table = source.table("CapacityToActivityUnit").unwrap();
        assert_eq!(table.indices(), ["REGION", "TECHNOLOGY"]);
        assert_eq!(table.get(&key(&["RE1", "GAS"])), Some(31.536));

        let rate = source.table("DiscountRate").unwrap();
        assert_eq!(rate.indices(), ["REGION"]);
        assert_eq!(rate.get(&key(&["RE1"])), Some(0.05));
    }

    #[test]
    fn year_columns_are_melted_into_year_index() {
        let source = read();
        let table = source.table("InputActivityRatio").unwrap();
        assert_eq!(
            table.indices(),
            ["REGION", "TECHNOLOGY", "FUEL", "MODE_OF_OPERATION", "YEAR"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&key(&["RE1", "GAS", "HEAT", "2", "2016"])), Some(1.2));
        assert_eq!(table.get(&key(&["RE1", "GAS", "HEAT", "10", "2015"])), Some(1.3));
    }

    #[test]
    fn implicit_set_domain_is_sorted_numerically() {
        let source = read();
        assert_eq!(source.set_values("MODE_OF_OPERATION").unwrap(), ["2", "10"]);
    }

    #[test]
    fn missing_sets_column_is_reported() {
        let err = ClicSandReader::default()
            .read_str("Technologies,Emissions\nCOAL,Region\n", PARAMETERS)
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == COMMODITIES));
    }

    #[test]
    fn missing_region_marker_is_malformed() {
        let sets = "Technologies,Commodities,Emissions\nCOAL,ELC,CO2\n";
        let err = ClicSandReader::default().read_str(sets, PARAMETERS).unwrap_err();
        assert!(matches!(err, SourceError::MalformedSheet { .. }));
    }

    #[test]
    fn invalid_value_names_parameter_and_line() {
        let params = "Parameter,REGION,Time indipendent variables\nDiscountRate,RE1,high\n";
        let err = ClicSandReader::default().read_str(SETS, params).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidNumber { ref field, row: 2, .. } if field == "DiscountRate"
        ));
    }

    #[test]
    fn text_domains_sort_lexicographically() {
        assert_eq!(
            sort_domain("TIMESLICE", key(&["S2", "S10", "S1"]), None),
            key(&["S1", "S10", "S2"])
        );
    }

    #[test]
    fn int_dtype_sorts_numerically_despite_a_bad_value() {
        assert_eq!(
            sort_domain("MODE_OF_OPERATION", key(&["10", "x", "2", "1"]), Some(DType::Int)),
            key(&["1", "2", "10", "x"])
        );
        assert_eq!(
            sort_domain("MODE_OF_OPERATION", key(&["10", "2"]), Some(DType::Str)),
            key(&["10", "2"])
        );
    }

    #[test]
    fn schema_dtype_orders_implicit_domain() {
        let schema = SchemaDocument::from_yaml_str(
            "MODE_OF_OPERATION:\n  type: set\n  dtype: str\n",
        )
        .unwrap();
        let source = ClicSandReader::new(YearRange::new(2015, 2016).unwrap())
            .with_schema(&schema)
            .read_str(SETS, PARAMETERS)
            .unwrap();
        assert_eq!(source.set_values("MODE_OF_OPERATION").unwrap(), ["10", "2"]);
    }
}
