//! Prune command implementation

use super::{fail, load_config, overall_sparsity};
use crate::cli::logging::log;
use crate::cli::{LogLevel, PruneArgs};
use crate::fidelity::WeightFidelity;
use crate::model::Model;
use crate::optimizer::Optimizer;
use crate::prune::Pruner;

pub fn run_prune(args: PruneArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Pruning {} with {}", args.model, args.config));

    let config = load_config(&args.config, args.config_file.as_deref())?;
    let model = Model::from_pretrained(&args.model).map_err(fail)?;
    log(level, LogLevel::Verbose, &format!("  Initial sparsity: {:.2}%", overall_sparsity(&model) * 100.0));

    // Without a dataset there is nothing to fine-tune on between pruning steps.
    let no_training = |_: &mut Model, _: usize| {};
    let pruner = Pruner::new(&config, WeightFidelity::new(model.clone()), no_training).map_err(fail)?;
    let mut optimizer = Optimizer::new(model, None, Some(pruner));
    let optimized = optimizer.fit().map_err(fail)?;

    if let Some(p) = &optimized.config().pruning {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Sparsity {:.2}% (target {:.2}%), fidelity {:.4}",
                p.achieved_sparsity * 100.0,
                p.target_sparsity * 100.0,
                p.metric
            ),
        );
        for (name, sparsity) in &p.layer_sparsity {
            log(level, LogLevel::Verbose, &format!("    {name}: {:.2}%", sparsity * 100.0));
        }
    }

    optimizer.save_pretrained(&args.output).map_err(fail)?;
    log(level, LogLevel::Normal, &format!("Saved to {}", args.output.display()));
    Ok(())
}
