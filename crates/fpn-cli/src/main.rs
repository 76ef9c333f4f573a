//! Command-line front end for the FPN converter.
//!
//! - `analyze`: parse a file and print the parse summary
//! - `stages`: list analysis stages with their own and cumulative active groups
//! - `convert`: write the MDPA, materials and constraint files for one stage

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use fpn_config::{AppConfig, ConfigError};
use fpn_inp::ParseOptions;
use fpn_io::{project, write_output_bundle};
use fpn_model::{ActiveGroups, Id, ParseSummary, ParsedFpn, parse_fpn_file};

#[derive(Debug, Parser)]
#[command(name = "fpn-cli", version, about = "Inspect FPN files and convert them to Kratos input")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to $FPN_CONFIG, then ./config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a file and print the parse summary.
    Analyze {
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List analysis stages with their active groups.
    Stages { file: PathBuf },

    /// Write `<name>.mdpa`, `<name>_materials.json` and `<name>_constraints.json`.
    Convert {
        file: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        /// Scope the output to the activation as of this stage
        #[arg(long)]
        stage: Option<Id>,

        /// Base name of the written files (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.as_deref());
    init_logging(&config);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn load_configuration(explicit: Option<&Path>) -> AppConfig {
    match AppConfig::discover(explicit) {
        Ok(cfg) => cfg,
        Err(err) => {
            // Logging is not installed yet.
            match &err {
                ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                    eprintln!("warning: {err}; using built-in defaults ({})", path.display());
                }
                ConfigError::Context { .. } => {
                    eprintln!("warning: {err}; using built-in defaults");
                }
            }
            AppConfig::default()
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    let options = parse_options(config);
    match command {
        Command::Analyze { file, json } => {
            let parsed = parse(&file, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parsed.summary)?);
            } else {
                print_summary(&parsed.summary);
            }
        }
        Command::Stages { file } => {
            let parsed = parse(&file, &options)?;
            print_stages(&parsed);
        }
        Command::Convert {
            file,
            out_dir,
            stage,
            name,
        } => {
            let parsed = parse(&file, &options)?;
            let projection_options = config.projection_options();
            let projection = project(&parsed.model, stage, &projection_options)
                .with_context(|| format!("failed to project {}", file.display()))?;
            let name = name.unwrap_or_else(|| bundle_name(&file, stage));
            let bundle = write_output_bundle(
                &out_dir,
                &name,
                &parsed.model,
                &projection,
                &projection_options,
            )?;
            println!("nodes: {}", projection.nodes.len());
            println!("elements: {}", projection.element_count());
            println!("materials: {}", projection.materials.len());
            println!("boundaries: {}", projection.boundaries.len());
            println!("mdpa: {}", bundle.mdpa_path.display());
            println!("materials_file: {}", bundle.materials_path.display());
            println!("constraints_file: {}", bundle.constraints_path.display());
        }
    }
    Ok(())
}

fn parse_options(config: &AppConfig) -> ParseOptions {
    let (options, unknown) = config.parse_options();
    for label in unknown {
        warn!(label = %label, "unknown encoding label in configuration, skipped");
    }
    options
}

fn parse(file: &Path, options: &ParseOptions) -> Result<ParsedFpn> {
    parse_fpn_file(file, options).with_context(|| format!("failed to parse {}", file.display()))
}

fn print_summary(summary: &ParseSummary) {
    if let Some(encoding) = &summary.encoding {
        println!("encoding: {} ({:?})", encoding.name, encoding.source);
    }
    let [x, y, z] = summary.offset.offset;
    println!("offset: {x} {y} {z} (from {} nodes)", summary.offset.sample_size);
    println!("total_lines: {}", summary.total_lines);
    println!("total_records: {}", summary.total_records());
    for (keyword, count) in &summary.record_counts {
        println!("  {keyword}: {count}");
    }
    println!("nodes: {}", summary.nodes);
    println!("volume_elements: {}", summary.volume_elements);
    println!("plate_elements: {}", summary.plate_elements);
    println!("line_elements: {}", summary.line_elements);
    println!("materials: {}", summary.materials);
    println!("boundary_groups: {}", summary.boundary_groups);
    println!("stages: {}", summary.stages);
    println!("decode_failures: {}", summary.decode_failures);
    println!("unrecognized_lines: {}", summary.unrecognized_lines);
    println!("orphan_continuations: {}", summary.orphan_continuations);
    println!("dropped_commands: {}", summary.dropped_commands);
    println!("duplicate_ids: {}", summary.duplicate_ids);
    if summary.had_replacements {
        println!("had_replacements: true");
    }
}

fn print_stages(parsed: &ParsedFpn) {
    let model = &parsed.model;
    if model.stages.is_empty() {
        println!("no stages");
        return;
    }
    for stage in &model.stages {
        let cumulative = model.active_groups_as_of(stage.id).unwrap_or_default();
        println!("stage {} \"{}\" (type {})", stage.id, stage.name, stage.stage_type);
        print_groups("  own", &stage.active);
        print_groups("  as of", &cumulative);
    }
}

fn print_groups(label: &str, groups: &ActiveGroups) {
    println!(
        "{label}: materials [{}] loads [{}] boundaries [{}]",
        format_ids(&groups.materials),
        format_ids(&groups.loads),
        format_ids(&groups.boundaries)
    );
}

fn format_ids(ids: &BTreeSet<Id>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Input file stem, suffixed with the stage when one is selected.
fn bundle_name(file: &Path, stage: Option<Id>) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    match stage {
        Some(id) => format!("{stem}_stage_{id}"),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_name_follows_input_stem_and_stage() {
        assert_eq!(bundle_name(Path::new("dir/pit.fpn"), None), "pit");
        assert_eq!(bundle_name(Path::new("pit.fpn"), Some(2)), "pit_stage_2");
        assert_eq!(bundle_name(Path::new(""), None), "model");
    }

    #[test]
    fn ids_are_comma_separated() {
        assert_eq!(format_ids(&BTreeSet::from([5, 1, 2])), "1, 2, 5");
        assert_eq!(format_ids(&BTreeSet::new()), "");
    }

    #[test]
    fn convert_arguments_parse() {
        let cli = Cli::try_parse_from([
            "fpn-cli", "convert", "pit.fpn", "--out-dir", "out", "--stage", "2",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Convert { stage, name, .. } => {
                assert_eq!(stage, Some(2));
                assert!(name.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
