//! CLI argument parsing
//!
//! ```bash
//! comprimir quantize ./bert-base --config org/bert-int8-dynamic --output ./bert-int8
//! comprimir prune ./bert-base --config ./sparsity.yml --output ./bert-sparse
//! comprimir inspect ./bert-int8 --format yaml
//! comprimir validate org/bert-int8-dynamic
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Comprimir: quantization, pruning and distillation for transformer checkpoints
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "comprimir")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Quantize a model to int8
    Quantize(QuantizeArgs),

    /// Prune a model by weight magnitude
    Prune(PruneArgs),

    /// Show what a saved directory contains
    Inspect(InspectArgs),

    /// Load and check an optimization config
    Validate(ValidateArgs),
}

/// Arguments for the quantize command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct QuantizeArgs {
    /// Model directory or hub repository
    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Config path, directory or hub repository
    #[arg(short, long)]
    pub config: String,

    /// Directory to save into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Config file name inside a directory or repository
    #[arg(long)]
    pub config_file: Option<String>,

    /// Also apply the config's pruning section before quantizing
    #[arg(long)]
    pub with_pruning: bool,

    /// JSON file of calibration batches, `{"<op>": [[f32, ...], ...]}`.
    /// Required for static quantization; ops without batches stay in fp32.
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,
}

/// Arguments for the prune command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PruneArgs {
    /// Model directory or hub repository
    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Config path, directory or hub repository
    #[arg(short, long)]
    pub config: String,

    /// Directory to save into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Config file name inside a directory or repository
    #[arg(long)]
    pub config_file: Option<String>,
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Saved directory or hub repository
    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Config path, directory or hub repository
    #[arg(value_name = "CONFIG")]
    pub config: String,

    /// Config file name inside a directory or repository
    #[arg(long)]
    pub config_file: Option<String>,

    /// Print the parsed config
    #[arg(short, long)]
    pub detailed: bool,
}

/// Output format for inspect
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json, yaml")),
        }
    }
}

/// Parse arguments without exiting on error.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
