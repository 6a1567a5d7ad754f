pub mod cli;
pub mod data;
pub mod diagnostics;
pub mod io_utils;
pub mod join;
pub mod loader;
pub mod metrics;
pub mod quantities;
pub mod recommend;
pub mod records;
pub mod report;
pub mod schema;
pub mod table;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, error, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, SchemaArgs},
    diagnostics::Diagnostics,
    records::{FileSummary, SourceData},
    schema::{Layout, SchemaRegistry},
    table::Align,
};

pub use crate::{
    loader::{load, load_all},
    metrics::compute_metrics,
    quantities::compute_common_quantities,
    recommend::compute_top_chains,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("hippo", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let registry = SchemaRegistry::standard();
    debug!("Source root: {:?}", cli.input);
    match &cli.command {
        Commands::Validate => handle_validate(&registry, &cli.input),
        Commands::Metrics(args) => {
            let data = load_sources(&registry, &cli.input);
            generate_metrics(&data, &args.output)
        }
        Commands::Recommend(args) => {
            let data = load_sources(&registry, &cli.input);
            generate_recommendations(&data, &args.output)
        }
        Commands::Common(args) => {
            let data = load_sources(&registry, &cli.input);
            generate_common_quantities(&data, &args.output)
        }
        Commands::Run(args) => {
            info!("Starting Hippo run from {:?}", cli.input);
            let data = load_sources(&registry, &cli.input);
            generate_metrics(&data, &args.output)?;
            generate_recommendations(&data, &args.output)?;
            generate_common_quantities(&data, &args.output)
        }
        Commands::Schema(args) => handle_schema(&registry, args),
    }
}

fn load_sources(registry: &SchemaRegistry, input: &Path) -> SourceData {
    let mut diagnostics = Diagnostics::new();
    let data = loader::load_all(registry, input, &mut diagnostics);
    diagnostics.log();
    data
}

fn handle_validate(registry: &SchemaRegistry, input: &Path) -> Result<()> {
    let data = load_sources(registry, input);
    let summaries: [(Layout, usize, &[FileSummary]); 3] = [
        (
            Layout::Pharmacies,
            data.pharmacies.len(),
            data.pharmacies.files.as_slice(),
        ),
        (Layout::Claims, data.claims.len(), data.claims.files.as_slice()),
        (Layout::Reverts, data.reverts.len(), data.reverts.files.as_slice()),
    ];

    let mut rows = Vec::with_capacity(summaries.len());
    let mut empty = Vec::new();
    for (layout, valid, files) in summaries {
        let rows_read = files.iter().map(|f| f.rows_read).sum::<usize>();
        rows.push(vec![
            layout.to_string(),
            files.len().to_string(),
            rows_read.to_string(),
            valid.to_string(),
            (rows_read - valid).to_string(),
        ]);
        if valid == 0 {
            empty.push(layout);
        } else {
            info!("{layout} data: {valid} valid row(s).");
        }
    }
    table::print_table(
        &["layout", "files", "rows", "valid", "quarantined"],
        &rows,
        &[
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
    );

    if !empty.is_empty() {
        bail!(
            "Data validation encountered issues: no valid rows for {}",
            empty.iter().join(", ")
        );
    }
    info!("All datasets validated successfully.");
    Ok(())
}

fn generate_metrics(data: &SourceData, output_dir: &Path) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let rows = compute_metrics(&data.claims, &data.reverts, &mut diagnostics);
    diagnostics.log();
    write_report(output_dir, report::METRICS_FILE, &rows, "Metrics")
}

fn generate_recommendations(data: &SourceData, output_dir: &Path) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let top_chains = compute_top_chains(&data.claims, &data.pharmacies, &mut diagnostics);
    diagnostics.log();
    write_report(
        output_dir,
        report::TOP_CHAINS_FILE,
        &top_chains,
        "Recommendations",
    )
}

fn generate_common_quantities(data: &SourceData, output_dir: &Path) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let quantities = compute_common_quantities(&data.claims, &mut diagnostics);
    diagnostics.log();
    write_report(
        output_dir,
        report::QUANTITIES_FILE,
        &quantities,
        "Common quantities",
    )
}

fn write_report<T>(output_dir: &Path, file_name: &str, records: &[T], label: &str) -> Result<()>
where
    T: Serialize,
{
    if records.is_empty() {
        error!("{label} computation resulted in an empty dataset; {file_name} not written.");
        return Ok(());
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Creating output directory {output_dir:?}"))?;
    let path = output_dir.join(file_name);
    io_utils::write_json(&path, records)?;
    info!("{label} saved to {} ({} record(s))", path.display(), records.len());
    Ok(())
}

fn handle_schema(registry: &SchemaRegistry, args: &SchemaArgs) -> Result<()> {
    if args.yaml {
        print!("{}", registry.to_yaml()?);
        return Ok(());
    }
    let mut rows = Vec::new();
    for (layout, schema) in registry.layouts() {
        for (idx, column) in schema.columns.iter().enumerate() {
            rows.push(vec![
                layout.to_string(),
                layout.default_format().to_string(),
                (idx + 1).to_string(),
                column.name.clone(),
                column.datatype.to_string(),
                if column.positive { "> 0" } else { "" }.to_string(),
            ]);
        }
    }
    table::print_table(
        &["layout", "format", "#", "column", "type", "constraint"],
        &rows,
        &[Align::Left, Align::Left, Align::Right],
    );
    Ok(())
}
