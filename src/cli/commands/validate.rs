//! Validate command implementation

use super::load_config;
use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::config::OptimizationConfig;

/// One line per configured section.
pub fn format_sections(config: &OptimizationConfig) -> String {
    let mut lines = Vec::new();
    if let Some(q) = config.quantization() {
        lines.push(format!(
            "  Quantization: {} {} ({}, {})",
            q.approach().short_name(),
            q.dtype(),
            q.scheme(),
            q.granularity()
        ));
    }
    if let Some(p) = config.pruning() {
        lines.push(format!(
            "  Pruning: {} to {:.2} over {} epoch(s), {} schedule",
            p.method().display_name(),
            p.target_sparsity(),
            p.num_epochs(),
            p.schedule().display_name()
        ));
    }
    if let Some(d) = config.distillation() {
        lines.push(format!(
            "  Distillation: temperature {}, alpha {}, {} epoch(s)",
            d.temperature, d.alpha, d.num_epochs
        ));
    }
    let tuning = config.tuning();
    lines.push(format!(
        "  Tuning: {:?}, max {} trial(s)",
        tuning.strategy, tuning.exit_policy.max_trials
    ));
    lines.join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating {}", args.config));
    let config = load_config(&args.config, args.config_file.as_deref())?;
    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(level, LogLevel::Normal, &format_sections(&config));

    if args.detailed {
        let yaml = config.to_yaml().map_err(|e| e.to_string())?;
        log(level, LogLevel::Normal, &yaml);
    }
    Ok(())
}
