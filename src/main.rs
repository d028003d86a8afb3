//! Comprimir CLI
//!
//! # Usage
//!
//! ```bash
//! # Quantize with a config from the hub
//! comprimir quantize ./bert-base --config org/bert-int8-dynamic --output ./bert-int8
//!
//! # Prune and quantize with one local config
//! comprimir quantize ./bert-base --config ./optimization.yml --output ./out --with-pruning
//!
//! # Show what a saved directory contains
//! comprimir inspect ./out --format yaml
//!
//! # Check a config
//! comprimir validate ./optimization.yml
//! ```

use clap::Parser;
use comprimir::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
