//! Command line definition for `sandtool`

use crate::config::PipelineConfig;
use crate::pipeline::SourceSpec;
use anyhow::{bail, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sand_schema::IndexSetPolicy;
use sand_template::SheetNaming;
use std::path::PathBuf;

fn source_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("sets")
                .long("sets")
                .value_parser(value_parser!(PathBuf))
                .requires("parameters")
                .conflicts_with("source-dir")
                .help("clicSAND SETS sheet exported as CSV"),
        )
        .arg(
            Arg::new("parameters")
                .long("parameters")
                .value_parser(value_parser!(PathBuf))
                .requires("sets")
                .help("clicSAND Parameters sheet exported as CSV"),
        )
        .arg(
            Arg::new("source-dir")
                .long("source-dir")
                .value_parser(value_parser!(PathBuf))
                .help("otoole data_csv directory to read instead of clicSAND sheets"),
        )
}

fn output_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("short-names")
                .long("short-names")
                .action(ArgAction::SetTrue)
                .help("Name output files after short_name where declared"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Fail if any field shape differs from the source"),
        )
}

/// Build the `sandtool` command
#[must_use]
pub fn build_cli() -> Command {
    Command::new("sandtool")
        .version(sand_schema::VERSION)
        .about("Bridge clicSAND data into otoole configs and CSV templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("YAML settings file; command line flags override it"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("otoole config.yaml [default: ./config.yaml]"),
        )
        .arg(
            Arg::new("start-year")
                .long("start-year")
                .global(true)
                .value_parser(value_parser!(i32))
                .help("First model year [default: 2015]"),
        )
        .arg(
            Arg::new("end-year")
                .long("end-year")
                .global(true)
                .value_parser(value_parser!(i32))
                .help("Last model year, inclusive [default: 2070]"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .subcommand(
            source_args(Command::new("classify").about("List index-independent and non-required fields"))
                .arg(
                    Arg::new("index")
                        .long("index")
                        .default_value("YEAR")
                        .help("Index to test independence against"),
                )
                .arg(
                    Arg::new("include-index-set")
                        .long("include-index-set")
                        .action(ArgAction::SetTrue)
                        .help("Count the index's own SET as independent of it"),
                ),
        )
        .subcommand(
            source_args(Command::new("reconcile").about("Write sand_config.yaml with only the fields the source provides"))
                .arg(
                    Arg::new("output-name")
                        .long("output-name")
                        .help("File name of the reconciled config [default: sand_config.yaml]"),
                )
                .arg(
                    Arg::new("no-prune")
                        .long("no-prune")
                        .action(ArgAction::SetTrue)
                        .help("Keep CSV files of removed fields"),
                ),
        )
        .subcommand(output_args(source_args(
            Command::new("populate")
                .about("Fill the template of --config from the source and write it as CSV")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory"),
                ),
        )))
        .subcommand(output_args(source_args(
            Command::new("run")
                .about("Reconcile, prune and populate the config's data_csv directory")
                .arg(
                    Arg::new("no-prune")
                        .long("no-prune")
                        .action(ArgAction::SetTrue)
                        .help("Keep CSV files of removed fields"),
                ),
        )))
}

/// Settings file first, then command line overrides
///
/// # Errors
/// Fails if the settings file cannot be loaded
pub fn pipeline_config(args: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match args.get_one::<PathBuf>("settings") {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::new(),
    };

    if let Some(path) = args.get_one::<PathBuf>("config") {
        config = config.with_config_path(path);
    }
    let start = args.get_one::<i32>("start-year").copied().unwrap_or(config.start_year);
    let end = args.get_one::<i32>("end-year").copied().unwrap_or(config.end_year);
    config = config.with_years(start, end);

    if flag(args, "include-index-set") {
        config = config.with_index_policy(IndexSetPolicy::Include);
    }
    if flag(args, "no-prune") {
        config = config.with_prune_csv(false);
    }
    if let Some(Some(name)) = args.try_get_one::<String>("output-name").ok() {
        config = config.with_sand_config_name(name);
    }
    Ok(config)
}

/// Source selected by `--sets`/`--parameters` or `--source-dir`
///
/// # Errors
/// Fails if neither is given
pub fn source_spec(args: &ArgMatches) -> Result<SourceSpec> {
    if let Some(dir) = args.get_one::<PathBuf>("source-dir") {
        return Ok(SourceSpec::CsvDir(dir.clone()));
    }
    match (
        args.get_one::<PathBuf>("sets"),
        args.get_one::<PathBuf>("parameters"),
    ) {
        (Some(sets), Some(parameters)) => Ok(SourceSpec::ClicSand {
            sets: sets.clone(),
            parameters: parameters.clone(),
        }),
        _ => bail!("a source is required: pass --sets and --parameters, or --source-dir"),
    }
}

/// `--sets`/`--parameters` or `--source-dir` was given
#[must_use]
pub fn has_source(args: &ArgMatches) -> bool {
    args.contains_id("source-dir") || args.contains_id("sets")
}

#[must_use]
pub fn sheet_naming(args: &ArgMatches) -> SheetNaming {
    if flag(args, "short-names") {
        SheetNaming::Short
    } else {
        SheetNaming::Full
    }
}

/// Flag lookup that tolerates subcommands not defining it
pub(crate) fn flag(args: &ArgMatches, id: &str) -> bool {
    args.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sub(argv: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        args.clone()
    }

    #[test]
    fn command_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let args = sub(&[
            "sandtool",
            "reconcile",
            "--config",
            "model/config.yaml",
            "--start-year",
            "2020",
            "--no-prune",
            "--output-name",
            "trimmed.yaml",
            "--source-dir",
            "model/data_csv",
        ]);
        let config = pipeline_config(&args).unwrap();

        assert_eq!(config.config_path, PathBuf::from("model/config.yaml"));
        assert_eq!(config.start_year, 2020);
        assert_eq!(config.end_year, 2070);
        assert!(!config.prune_csv);
        assert_eq!(config.sand_config_name, "trimmed.yaml");
        assert_eq!(
            source_spec(&args).unwrap(),
            SourceSpec::CsvDir(PathBuf::from("model/data_csv"))
        );
    }

    #[test]
    fn clicsand_source_needs_both_sheets() {
        assert!(build_cli()
            .try_get_matches_from(["sandtool", "run", "--sets", "SETS.csv"])
            .is_err());

        let args = sub(&[
            "sandtool",
            "run",
            "--sets",
            "SETS.csv",
            "--parameters",
            "Parameters.csv",
            "--short-names",
        ]);
        assert!(matches!(source_spec(&args).unwrap(), SourceSpec::ClicSand { .. }));
        assert_eq!(sheet_naming(&args), SheetNaming::Short);
    }

    #[test]
    fn classify_without_source_is_allowed() {
        let args = sub(&["sandtool", "classify", "--include-index-set"]);
        assert!(!has_source(&args));
        assert!(source_spec(&args).is_err());
        let config = pipeline_config(&args).unwrap();
        assert_eq!(config.index_policy, IndexSetPolicy::Include);
        assert_eq!(args.get_one::<String>("index").unwrap(), "YEAR");
    }

    #[test]
    fn populate_requires_output_directory() {
        assert!(build_cli()
            .try_get_matches_from(["sandtool", "populate", "--source-dir", "csv"])
            .is_err());
    }
}
