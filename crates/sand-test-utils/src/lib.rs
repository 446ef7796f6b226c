//! Testing utilities for SAND workspace
//!
//! Shared fixtures: a small otoole config, matching clicSAND sheet exports
//! and a source interface built in code.

#![allow(missing_docs)]

use sand_interface::{ParamTable, SourceInterface, YearRange};
use sand_schema::SchemaDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// otoole config with sets, params, a sectioned storage block and results
pub const SAMPLE_CONFIG: &str = r"
REGION:
  dtype: str
  type: set
TECHNOLOGY:
  dtype: str
  type: set
FUEL:
  dtype: str
  type: set
EMISSION:
  dtype: str
  type: set
MODE_OF_OPERATION:
  dtype: int
  type: set
YEAR:
  dtype: int
  type: set
DiscountRate:
  indices: [REGION]
  type: param
  dtype: float
  default: 0.05
CapacityToActivityUnit:
  indices: [REGION, TECHNOLOGY]
  type: param
  dtype: float
  default: 1
CapitalCost:
  indices: [REGION, TECHNOLOGY, YEAR]
  type: param
  dtype: float
  default: 0
InputActivityRatio:
  indices: [REGION, TECHNOLOGY, FUEL, MODE_OF_OPERATION, YEAR]
  type: param
  dtype: float
  default: 0
EmissionActivityRatio:
  indices: [REGION, TECHNOLOGY, EMISSION, MODE_OF_OPERATION, YEAR]
  type: param
  dtype: float
  default: 0
storage:
  STORAGE:
    dtype: str
    type: set
  TechnologyToStorage:
    indices: [REGION, TECHNOLOGY, STORAGE, MODE_OF_OPERATION]
    type: param
    dtype: float
    default: 0
    short_name: TechToStorage
NewCapacity:
  indices: [REGION, TECHNOLOGY, YEAR]
  type: result
  dtype: float
  default: 0
  calculated: false
";

/// clicSAND `SETS` sheet export
pub const CLICSAND_SETS: &str = "\
Technologies,Commodities,Emissions
Code,Code,Code
COAL,ELC,CO2
GAS,,
SOLAR,,
,,Region
,,RE1
,,ResultsPath: ./results
";

/// clicSAND `Parameters` sheet export over 2015..=2016
pub const CLICSAND_PARAMETERS: &str = "\
Parameter,REGION,REGION2,TECHNOLOGY,FUEL,EMISSION,MODE_OF_OPERATION,Time indipendent variables,2015,2016
DiscountRate,RE1,,,,,,0.05,,
CapacityToActivityUnit,RE1,,COAL,,,,31.536,,
CapitalCost,RE1,,COAL,,,,,1500,1450
CapitalCost,RE1,,GAS,,,,,900,
InputActivityRatio,RE1,,GAS,ELC,,1,,1.8,1.8
";

/// `Parameters` sheet export whose set columns are not in config order
pub const CLICSAND_PARAMETERS_REORDERED: &str = "\
Parameter,FUEL,MODE_OF_OPERATION,TECHNOLOGY,REGION,Time indipendent variables,2015,2016
DiscountRate,,,,RE1,0.05,,
CapacityToActivityUnit,,,COAL,RE1,31.536,,
InputActivityRatio,ELC,1,GAS,RE1,,1.8,1.7
";

pub const TECHNOLOGIES: [&str; 3] = ["COAL", "GAS", "SOLAR"];

pub fn sample_schema() -> SchemaDocument {
    SchemaDocument::from_yaml_str(SAMPLE_CONFIG).unwrap()
}

pub fn ten_years() -> YearRange {
    YearRange::new(2015, 2024).unwrap()
}

pub fn key(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Source over three technologies and 2015..=2024 with a full `CapitalCost`
/// and a sparse `CapacityToActivityUnit`
pub fn sample_source() -> SourceInterface {
    let years = ten_years();

    let mut capital_cost = ParamTable::new("CapitalCost", key(&["REGION", "TECHNOLOGY", "YEAR"]));
    for (i, tech) in TECHNOLOGIES.iter().enumerate() {
        for year in years.iter() {
            let value = 1000.0 * f64::from(u8::try_from(i + 1).unwrap()) + f64::from(year - 2015);
            capital_cost
                .insert(key(&["RE1", *tech, year.to_string().as_str()]), value)
                .unwrap();
        }
    }

    let mut activity_unit = ParamTable::new("CapacityToActivityUnit", key(&["REGION", "TECHNOLOGY"]));
    activity_unit.insert(key(&["RE1", "COAL"]), 31.536).unwrap();

    let mut discount_rate = ParamTable::new("DiscountRate", key(&["REGION"]));
    discount_rate.insert(key(&["RE1"]), 0.05).unwrap();

    SourceInterface::builder(years)
        .set("REGION", ["RE1"])
        .set("TECHNOLOGY", TECHNOLOGIES)
        .set("FUEL", ["ELC"])
        .param(capital_cost)
        .param(activity_unit)
        .param(discount_rate)
        .build()
}

/// Write `content` to `dir/name`, returning the path
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
