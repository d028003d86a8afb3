//! Quantize command implementation

use std::collections::BTreeMap;
use std::path::Path;

use super::{fail, load_config};
use crate::cli::logging::log;
use crate::cli::{LogLevel, QuantizeArgs};
use crate::error::Error;
use crate::fidelity::WeightFidelity;
use crate::model::Model;
use crate::optimizer::Optimizer;
use crate::prune::Pruner;
use crate::quant::{CalibrationSet, Quantizer};

/// Read calibration batches keyed by op name from a JSON file.
fn read_calibration(path: &Path) -> Result<CalibrationSet, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading calibration file {}", path.display()), e))?;
    let batches: BTreeMap<String, Vec<Vec<f32>>> = serde_json::from_str(&text)
        .map_err(|e| Error::Serialization { message: format!("{}: {e}", path.display()) })?;
    let mut set = CalibrationSet::new();
    for (op, op_batches) in batches {
        for batch in op_batches {
            set.push(op.clone(), batch);
        }
    }
    Ok(set)
}

pub fn run_quantize(args: QuantizeArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Quantizing {} with {}", args.model, args.config));

    let config = load_config(&args.config, args.config_file.as_deref())?;
    let model = Model::from_pretrained(&args.model).map_err(fail)?;
    let original_bytes = model.memory_bytes();
    log(
        level,
        LogLevel::Verbose,
        &format!("  Loaded {} weights ({} parameters)", model.len(), model.num_parameters()),
    );

    let mut quantizer = Quantizer::new(&config, WeightFidelity::new(model.clone())).map_err(fail)?;
    if let Some(path) = &args.calibration {
        let set = read_calibration(path).map_err(fail)?;
        log(level, LogLevel::Verbose, &format!("  Calibration batches for {} op(s)", set.ops().count()));
        quantizer = quantizer.with_calibration(set);
    }
    let pruner = if args.with_pruning {
        let no_training = |_: &mut Model, _: usize| {};
        Some(Pruner::new(&config, WeightFidelity::new(model.clone()), no_training).map_err(fail)?)
    } else {
        None
    };

    let mut optimizer = Optimizer::new(model, Some(quantizer), pruner);
    let optimized = optimizer.fit().map_err(fail)?;
    if let Some(q) = &optimized.config().quantization {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  {} int8 weights, {} kept in fp32, fidelity {:.4} after {} trial(s)",
                q.quantized_ops.len(),
                q.fallback_ops.len(),
                q.tuning.final_metric,
                q.tuning.trials
            ),
        );
    }
    if let Some(p) = &optimized.config().pruning {
        log(level, LogLevel::Normal, &format!("  Sparsity: {:.2}%", p.achieved_sparsity * 100.0));
    }
    let quantized_bytes = optimized.model().memory_bytes();
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Size: {original_bytes} -> {quantized_bytes} bytes ({:.2}x)",
            original_bytes as f64 / quantized_bytes.max(1) as f64
        ),
    );

    optimizer.save_pretrained(&args.output).map_err(fail)?;
    log(level, LogLevel::Normal, &format!("Saved to {}", args.output.display()));
    Ok(())
}
