//! `sandtool` command line entry point.

use anyhow::Result;
use clap::ArgMatches;
use sand_cli::cli::{self, build_cli};
use sand_cli::logging::init_logging;
use sand_cli::pipeline::{self, PopulateOutcome};
use sand_template::FieldStatus;

fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        unreachable!("subcommand is required");
    };

    init_logging(args.get_flag("verbose"))?;
    let config = cli::pipeline_config(args)?;

    match name {
        "classify" => classify(&config, args),
        "reconcile" => {
            let schema = pipeline::load_schema(&config.config_path)?;
            let source = cli::source_spec(args)?.load(&config, &schema)?;
            let outcome = pipeline::reconcile(&config, &schema, &source)?;

            println!("Wrote {}", outcome.sand_config.path.display());
            println!("  Fields kept: {}", outcome.sand_config.document.len());
            print_list("  Removed", &outcome.sand_config.removed);
            print_list("  Results over removed sets", &outcome.sand_config.dangling);
            println!("  CSV files pruned: {}", outcome.pruned.len());
            Ok(())
        }
        "populate" => {
            let schema = pipeline::load_schema(&config.config_path)?;
            let source = cli::source_spec(args)?.load(&config, &schema)?;
            let Some(out) = args.get_one::<std::path::PathBuf>("out") else {
                unreachable!("--out is required");
            };
            let outcome = pipeline::populate_into(
                &schema,
                &source,
                out,
                cli::sheet_naming(args),
                args.get_flag("strict"),
            )?;
            print_populate(&outcome);
            Ok(())
        }
        "run" => {
            let summary = pipeline::run(
                &config,
                &cli::source_spec(args)?,
                cli::sheet_naming(args),
                args.get_flag("strict"),
            )?;
            println!("Wrote {}", summary.reconcile.sand_config.path.display());
            print_list("  Removed", &summary.reconcile.sand_config.removed);
            println!("  CSV files pruned: {}", summary.reconcile.pruned.len());
            print_populate(&summary.populate);
            Ok(())
        }
        other => unreachable!("unknown subcommand {other}"),
    }
}

fn classify(config: &sand_cli::PipelineConfig, args: &ArgMatches) -> Result<()> {
    let schema = pipeline::load_schema(&config.config_path)?;
    let source = if cli::has_source(args) {
        Some(cli::source_spec(args)?.load(config, &schema)?)
    } else {
        None
    };
    let index = args
        .get_one::<String>("index")
        .map_or("YEAR", String::as_str);

    let classification = pipeline::classify(config, &schema, source.as_ref(), index);
    print_list(
        &format!("{}-independent fields", classification.index),
        &classification.independent,
    );
    if let Some(non_required) = &classification.non_required {
        print_list("Non-required fields", non_required);
    }
    Ok(())
}

fn print_populate(outcome: &PopulateOutcome) {
    let template = &outcome.report.template;
    println!("Wrote {} files", outcome.written.len());
    println!("  Populated cells: {}", template.populated_cells());
    let blank: Vec<String> = template.blank_fields().map(str::to_string).collect();
    print_list("  Blank", &blank);
    let mismatched: Vec<String> = template
        .fields()
        .filter(|f| f.status() == FieldStatus::Mismatched)
        .map(|f| f.name().to_string())
        .collect();
    print_list("  Mismatched", &mismatched);
}

fn print_list(label: &str, names: &[String]) {
    if names.is_empty() {
        println!("{label}: none");
    } else {
        println!("{label} ({}): {}", names.len(), names.join(", "));
    }
}
