//! SAND Template
//!
//! Fills the otoole input layout derived from a schema with data from a
//! source interface, merges data preparation sheets into it, and writes it
//! out as a `data_csv` directory.
//!
//! # Example
//!
//! ```rust
//! use sand_interface::{ParamTable, SourceInterface, YearRange};
//! use sand_schema::SchemaDocument;
//! use sand_template::{populate, TargetTemplate};
//!
//! let schema = SchemaDocument::from_yaml_str(
//!     "REGION:\n  type: set\nDiscountRate:\n  indices: [REGION]\n  type: param\n",
//! )?;
//! let mut rate = ParamTable::new("DiscountRate", vec!["REGION".to_string()]);
//! rate.insert(vec!["RE1".to_string()], 0.05)?;
//! let source = SourceInterface::builder(YearRange::default())
//!     .set("REGION", ["RE1"])
//!     .param(rate)
//!     .build();
//!
//! let populated = populate(&TargetTemplate::from_schema(&schema), &source).into_result()?;
//! assert_eq!(populated.populated_cells(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod edit;
pub mod error;
pub mod populate;
pub mod template;
pub mod writer;

pub use edit::{
    add_emission_param, add_fuel_param, add_segregable_param, add_single_param, add_tech,
    replace_set_code, MergeSummary,
};
pub use error::{FieldShapeMismatch, TemplateError, TemplateResult};
pub use populate::{populate, FieldStatus, FieldValues, PopulateReport, PopulatedField, PopulatedTemplate, Row};
pub use template::{TargetTemplate, TemplateField};
pub use writer::{CsvTemplateWriter, SheetNaming};
