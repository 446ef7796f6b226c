//! Pipeline steps behind each `sandtool` subcommand
//!
//! load schema, read source, classify, reconcile, populate, write.

use crate::config::PipelineConfig;
use anyhow::{Context, Result};
use sand_interface::{ClicSandReader, SourceInterface};
use sand_schema::{
    index_independent_fields, non_required_fields, prune_csv_dir, registry, write_sand_config,
    SandConfig, SchemaDocument,
};
use sand_template::PopulatedTemplate;
use sand_template::{
    populate, CsvTemplateWriter, PopulateReport, SheetNaming, TargetTemplate, TemplateError,
};
use std::path::{Path, PathBuf};

/// Where source data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// clicSAND `SETS` and `Parameters` sheets exported as CSV
    ClicSand { sets: PathBuf, parameters: PathBuf },
    /// otoole `data_csv` directory
    CsvDir(PathBuf),
}

impl SourceSpec {
    /// Read the source; `schema` supplies the dtypes of implicit sets
    ///
    /// # Errors
    /// Fails if the year range is invalid or the source cannot be read
    pub fn load(&self, config: &PipelineConfig, schema: &SchemaDocument) -> Result<SourceInterface> {
        let years = config.years()?;
        match self {
            Self::ClicSand { sets, parameters } => ClicSandReader::new(years)
                .with_schema(schema)
                .read_files(sets, parameters)
                .context("Failed to read clicSAND sheets"),
            Self::CsvDir(dir) => SourceInterface::from_csv_dir(dir, years)
                .with_context(|| format!("Failed to read csv directory {}", dir.display())),
        }
    }
}

/// # Errors
/// Fails if the config is missing or malformed
pub fn load_schema(path: &Path) -> Result<SchemaDocument> {
    registry::load(path).with_context(|| format!("Failed to load schema {}", path.display()))
}

/// Output of [`classify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub index: String,
    pub independent: Vec<String>,
    /// Present when a source was given
    pub non_required: Option<Vec<String>>,
}

#[must_use]
pub fn classify(
    config: &PipelineConfig,
    schema: &SchemaDocument,
    source: Option<&SourceInterface>,
    index: &str,
) -> Classification {
    Classification {
        index: index.to_string(),
        independent: index_independent_fields(schema, index, config.index_policy),
        non_required: source.map(|s| non_required_fields(schema, s.field_set())),
    }
}

/// Output of [`reconcile`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub sand_config: SandConfig,
    /// CSV files deleted from the data directory
    pub pruned: Vec<PathBuf>,
}

/// Write the reconciled config and prune the CSV directory if enabled
///
/// # Errors
/// Fails if the config cannot be written or a CSV file cannot be removed
pub fn reconcile(
    config: &PipelineConfig,
    schema: &SchemaDocument,
    source: &SourceInterface,
) -> Result<ReconcileOutcome> {
    let sand_config = write_sand_config(
        schema,
        source.field_set(),
        &config.config_path,
        &config.sand_config_name,
    )
    .context("Failed to write reconciled config")?;

    let pruned = if config.prune_csv {
        let dir = config.csv_dir();
        if dir.is_dir() {
            prune_csv_dir(&dir, &sand_config.removed)
                .with_context(|| format!("Failed to prune {}", dir.display()))?
        } else {
            tracing::debug!(dir = %dir.display(), "no csv directory to prune");
            Vec::new()
        }
    } else {
        Vec::new()
    };

    Ok(ReconcileOutcome {
        sand_config,
        pruned,
    })
}

/// Output of [`populate_into`]
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOutcome {
    pub report: PopulateReport,
    pub written: Vec<PathBuf>,
}

/// Populate the template of `schema` without writing anything
///
/// # Errors
/// With `strict`, fails if any field shape differs from the source
pub fn populate_checked(
    schema: &SchemaDocument,
    source: &SourceInterface,
    strict: bool,
) -> Result<PopulateReport> {
    let report = populate(&TargetTemplate::from_schema(schema), source);
    if strict && !report.is_clean() {
        return Err(TemplateError::ShapeMismatches(report.mismatches))
            .context("Template does not match source");
    }
    Ok(report)
}

/// # Errors
/// Fails if the directory or a file cannot be written
pub fn write_template(
    template: &PopulatedTemplate,
    out_dir: &Path,
    naming: SheetNaming,
) -> Result<Vec<PathBuf>> {
    CsvTemplateWriter::new()
        .with_naming(naming)
        .write(template, out_dir)
        .with_context(|| format!("Failed to write template to {}", out_dir.display()))
}

/// Populate the template of `schema` and write it to `out_dir`
///
/// With `strict`, any shape mismatch fails before anything is written.
///
/// # Errors
/// Fails on mismatches in strict mode or if writing fails
pub fn populate_into(
    schema: &SchemaDocument,
    source: &SourceInterface,
    out_dir: &Path,
    naming: SheetNaming,
    strict: bool,
) -> Result<PopulateOutcome> {
    let report = populate_checked(schema, source, strict)?;
    let written = write_template(&report.template, out_dir, naming)?;
    Ok(PopulateOutcome { report, written })
}

/// Summary of a full [`run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub reconcile: ReconcileOutcome,
    pub populate: PopulateOutcome,
}

/// Full pipeline: reconcile the config against the source, then fill the
/// CSV directory from the reconciled config
///
/// The template is populated in memory first, so a strict shape failure
/// leaves the config directory and the CSV directory untouched.
///
/// # Errors
/// Fails at the first step that fails
pub fn run(
    config: &PipelineConfig,
    source_spec: &SourceSpec,
    naming: SheetNaming,
    strict: bool,
) -> Result<RunSummary> {
    let schema = load_schema(&config.config_path)?;
    let source = source_spec.load(config, &schema)?;

    let reconciled = sand_schema::reconcile(&schema, source.field_set());
    let report = populate_checked(&reconciled, &source, strict)?;

    let reconcile = reconcile(config, &schema, &source)?;
    let written = write_template(&report.template, &config.csv_dir(), naming)?;
    let populate = PopulateOutcome { report, written };

    tracing::info!(
        removed = reconcile.sand_config.removed.len(),
        pruned = reconcile.pruned.len(),
        files = populate.written.len(),
        "pipeline complete"
    );
    Ok(RunSummary {
        reconcile,
        populate,
    })
}
