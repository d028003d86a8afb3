//! CLI module for comprimir
//!
//! Argument parsing, user-facing output and the command handlers.

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, InspectArgs, OutputFormat, PruneArgs, QuantizeArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
