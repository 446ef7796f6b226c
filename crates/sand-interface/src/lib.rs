//! SAND Interface
//!
//! Model data as a data source provides it: the fields it declares, the
//! domains of its sets and the values of its parameters.
//!
//! Two readers build a [`SourceInterface`]:
//!
//! - [`SourceInterface::from_csv_dir`] for an otoole `data_csv` directory
//! - [`ClicSandReader`] for the `SETS` and `Parameters` sheets of a clicSAND
//!   workbook, exported as CSV
//!
//! The YEAR domain always comes from the configured [`YearRange`].
//!
//! [`PrepWorkbook`] reads data preparation sheets whose values are merged
//! into a populated template afterwards.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod clicsand;
pub mod csv_dir;
pub mod error;
pub mod interface;
pub mod prep;
pub mod table;
pub mod years;

pub use clicsand::{ClicSandReader, PARAMETERS_SHEET, SETS_SHEET};
pub use csv_dir::VALUE;
pub use error::{SourceError, SourceResult};
pub use interface::{InterfaceField, InterfaceFieldSet, SourceInterface, SourceInterfaceBuilder};
pub use prep::{PrepSheet, PrepValue, PrepWorkbook};
pub use table::ParamTable;
pub use years::{YearRange, YEAR};
