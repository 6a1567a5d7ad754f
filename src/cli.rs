use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_INPUT_DIR: &str = "data/input";
pub const DEFAULT_OUTPUT_DIR: &str = "data/output";

#[derive(Debug, Parser)]
#[command(author, version, about = "Hippo - pharmacy claims processing", long_about = None)]
pub struct Cli {
    /// Source root containing pharmacies/, claims/ and reverts/ subdirectories
    #[arg(short = 'i', long = "input", global = true, default_value = DEFAULT_INPUT_DIR)]
    pub input: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate input data files and summarize valid rows per dataset
    Validate,
    /// Generate fill metrics per pharmacy and drug
    Metrics(OutputArgs),
    /// Generate top 2 chain recommendations per drug
    Recommend(OutputArgs),
    /// Generate most common prescription quantities per drug
    Common(OutputArgs),
    /// Generate all three reports from a single load
    Run(OutputArgs),
    /// Print the column schema of every input layout
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output directory for generated reports
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Print the registry as YAML instead of a table
    #[arg(long)]
    pub yaml: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_input_after_subcommand() {
        let cli = Cli::try_parse_from(["hippo", "metrics", "--input", "in", "-o", "out"])
            .expect("parse");
        assert_eq!(cli.input, PathBuf::from("in"));
        match cli.command {
            Commands::Metrics(args) => assert_eq!(args.output, PathBuf::from("out")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from(["hippo", "common"]).expect("parse");
        assert_eq!(cli.input, PathBuf::from(DEFAULT_INPUT_DIR));
        match cli.command {
            Commands::Common(args) => assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT_DIR)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verifies_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
