//! CLI command implementations

mod inspect;
mod prune;
mod quantize;
mod validate;


use crate::cli::{Cli, Command, LogLevel};
use crate::config::{ConfigLoader, OptimizationConfig};
use crate::error::Error;
use crate::model::Model;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Quantize(args) => quantize::run_quantize(args, log_level),
        Command::Prune(args) => prune::run_prune(args, log_level),
        Command::Inspect(args) => inspect::run_inspect(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
    }
}

/// Render an error with its code for the terminal.
fn fail(e: Error) -> String {
    format!("[{}] {e}", e.code())
}

fn load_config(identifier: &str, file_name: Option<&str>) -> Result<OptimizationConfig, String> {
    let loader = match file_name {
        Some(name) => ConfigLoader::new().with_file_name(name),
        None => ConfigLoader::new(),
    };
    loader.load(identifier).map_err(fail)
}

/// Zero fraction over all weights, for summaries.
fn overall_sparsity(model: &Model) -> f32 {
    let total = model.num_parameters();
    if total == 0 {
        return 0.0;
    }
    let zeros: f32 = model.weights().map(|(_, w)| w.sparsity() * w.numel() as f32).sum();
    zeros / total as f32
}
