//! SAND Schema
//!
//! Typed access to the otoole `config.yaml` that describes an OSeMOSYS
//! model's sets, parameters and results.
//!
//! # Core Concepts
//!
//! - [`SchemaDocument`]: ordered sections of [`FieldDescriptor`]s
//! - [`FieldKind`]: `set`, `param` or `result`
//! - [`IndexId`]: interned index reference, compared by identity
//! - [`FieldSet`]: the field names a source interface declares
//!
//! # Operations
//!
//! - [`registry::load`]: read a document from disk
//! - [`index_independent_fields`] / [`non_required_fields`]: classification
//! - [`reconcile`] / [`write`]: regenerate and persist a trimmed document
//!
//! # Example
//!
//! ```rust
//! use sand_schema::{index_independent_fields, reconcile, IndexSetPolicy, SchemaDocument};
//!
//! let schema = SchemaDocument::from_yaml_str(
//!     "YEAR:\n  type: set\nDiscountRate:\n  type: param\n",
//! )?;
//! assert_eq!(
//!     index_independent_fields(&schema, "YEAR", IndexSetPolicy::Exclude),
//!     vec!["DiscountRate"]
//! );
//!
//! let interface: &[&str] = &["YEAR"];
//! assert_eq!(reconcile(&schema, interface).len(), 1);
//! # Ok::<(), sand_schema::SchemaError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classify;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod persist;
pub mod reconcile;
pub mod registry;

pub use classify::{
    dangling_results, fields_depending_on, fields_of_kind, index_independent_fields,
    non_required_fields, FieldSet, IndexSetPolicy,
};
pub use descriptor::{DType, FieldDescriptor, FieldKind, IndexId};
pub use document::{SchemaDocument, Section};
pub use error::{SchemaError, SchemaResult};
pub use reconcile::{prune_csv_dir, reconcile, write, write_sand_config, SandConfig, SAND_CONFIG_FILE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
