//! SAND CLI
//!
//! Library side of the `sandtool` binary: command definition, settings,
//! logging and the pipeline steps each subcommand runs.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;

pub use cli::build_cli;
pub use config::PipelineConfig;
pub use pipeline::{Classification, PopulateOutcome, ReconcileOutcome, RunSummary, SourceSpec};
