//! Quantization sessions.

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use super::calibration::{calibrate_activations, CalibrationSet};
use super::int8::{fake_quantize, quantization_mse, quantize_tensor};
use super::tuning::{self, TuningOutcome};
use crate::callbacks::{EvaluationFunction, TrainingFunction};
use crate::config::{OptimizationConfig, QuantApproach, QuantizationConfig, TuningStrategy};
use crate::effective::{AppliedQuantization, TuningSummary};
use crate::error::{Error, Result};
use crate::model::{Model, Weight};

/// Quantization settings plus the callbacks that judge and fine-tune candidates.
///
/// Construction only stores its arguments; callbacks run inside
/// [`Optimizer::fit`](crate::Optimizer::fit).
pub struct Quantizer<'a> {
    config: OptimizationConfig,
    settings: QuantizationConfig,
    eval: Box<dyn EvaluationFunction + 'a>,
    train: Option<Box<dyn TrainingFunction + 'a>>,
    calibration: Option<CalibrationSet>,
}

impl std::fmt::Debug for Quantizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quantizer")
            .field("config", &self.config)
            .field("train", &self.train.is_some())
            .field("calibration", &self.calibration)
            .finish_non_exhaustive()
    }
}

impl<'a> Quantizer<'a> {
    /// # Errors
    ///
    /// `MalformedConfig` if `config` has no quantization section.
    pub fn new(config: &OptimizationConfig, eval: impl EvaluationFunction + 'a) -> Result<Self> {
        let settings = config.quantization().cloned().ok_or_else(|| {
            Error::malformed(config.source().unwrap_or("<in-memory>"), "no quantization section")
        })?;
        Ok(Self {
            config: config.clone(),
            settings,
            eval: Box::new(eval),
            train: None,
            calibration: None,
        })
    }

    /// Activation samples for static quantization.
    #[must_use]
    pub fn with_calibration(mut self, calibration: CalibrationSet) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Training step for quantization-aware training.
    #[must_use]
    pub fn with_train_func(mut self, train: impl TrainingFunction + 'a) -> Self {
        self.train = Some(Box::new(train));
        self
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Checks that need no callback: attached data matches the approach.
    pub(crate) fn check_ready(&self) -> Result<()> {
        let approach = self.settings.approach();
        if approach.requires_calibration()
            && self.calibration.as_ref().is_none_or(CalibrationSet::is_empty)
        {
            return Err(Error::CalibrationRequired { approach: approach.to_string() });
        }
        if approach.requires_training() && self.train.is_none() {
            return Err(Error::MissingTrainingFunction { approach: approach.to_string() });
        }
        Ok(())
    }

    /// Float weights of rank ≥ 2 named `*weight` that no pattern excludes.
    fn eligible_ops(&self, model: &Model) -> Vec<String> {
        let settings = &self.settings;
        model
            .weights()
            .filter(|(name, w)| {
                matches!(w, Weight::Float(a) if a.ndim() >= 2)
                    && name.ends_with("weight")
                    && !settings.is_excluded(name)
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Candidate ops ordered for fallback.
    fn fallback_order(&self, model: &Model, candidates: &[String]) -> Vec<String> {
        let settings = &self.settings;
        match self.config.tuning().strategy {
            TuningStrategy::Basic => candidates.iter().rev().cloned().collect(),
            TuningStrategy::Mse => {
                let mut scored: Vec<(f32, &String)> = candidates
                    .iter()
                    .filter_map(|op| {
                        let weight = model.weight(op)?;
                        let values = weight.to_f32_vec();
                        let deq = fake_quantize(
                            &values,
                            weight.shape(),
                            settings.granularity(),
                            settings.scheme(),
                        );
                        Some((quantization_mse(&values, &deq), op))
                    })
                    .collect();
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));
                scored.into_iter().map(|(_, op)| op.clone()).collect()
            }
        }
    }

    /// Quantize `model`, returning the int8 model and a report of what was applied.
    pub(crate) fn run(&mut self, mut model: Model) -> Result<(Model, AppliedQuantization)> {
        self.check_ready()?;
        let settings = self.settings.clone();
        let tuning_config = *self.config.tuning();
        let approach = settings.approach();

        let eligible = self.eligible_ops(&model);
        if eligible.is_empty() {
            warn!("no eligible weights to quantize");
        }
        info!(%approach, ops = eligible.len(), "quantization started");

        let baseline = self.eval.evaluate(&model)?;
        debug!(baseline, "fp32 baseline");

        if approach == QuantApproach::AwareTraining {
            let epochs = settings.train_epochs();
            if let Some(train) = self.train.as_mut() {
                for epoch in 0..epochs {
                    fake_quantize_ops(&settings, &mut model, &eligible)?;
                    train.train(&mut model, epoch)?;
                    debug!(epoch, "quantization-aware epoch done");
                }
            }
        }

        let mut activation_ranges = BTreeMap::new();
        let mut uncalibrated = Vec::new();
        if approach == QuantApproach::Static {
            if let Some(set) = &self.calibration {
                activation_ranges = calibrate_activations(
                    set,
                    eligible.iter().map(String::as_str),
                    settings.calibration(),
                    settings.scheme(),
                );
            }
            uncalibrated = eligible
                .iter()
                .filter(|op| !activation_ranges.contains_key(op.as_str()))
                .cloned()
                .collect();
            if !uncalibrated.is_empty() {
                warn!(ops = ?uncalibrated, "no calibration samples, keeping fp32");
            }
        }

        let candidates: Vec<String> =
            eligible.iter().filter(|op| !uncalibrated.contains(op)).cloned().collect();
        let order = self.fallback_order(&model, &candidates);

        let eval = &mut self.eval;
        let TuningOutcome { trials, metric, fallback } =
            tuning::search(&tuning_config, baseline, order, |fallback| {
                let skip: HashSet<&String> = fallback.iter().collect();
                let mut candidate = model.clone();
                let ops = candidates.iter().filter(|op| !skip.contains(op));
                quantize_ops(&settings, &mut candidate, ops);
                eval.evaluate(&candidate)
            })?;

        let skip: HashSet<&String> = fallback.iter().collect();
        let quantized_ops: Vec<String> =
            candidates.iter().filter(|op| !skip.contains(op)).cloned().collect();
        quantize_ops(&settings, &mut model, &quantized_ops);
        activation_ranges.retain(|op, _| quantized_ops.contains(op));

        let fallback_ops: Vec<String> =
            eligible.iter().filter(|op| !quantized_ops.contains(op)).cloned().collect();

        info!(
            quantized = quantized_ops.len(),
            fallback = fallback_ops.len(),
            trials,
            metric,
            "quantization finished"
        );

        Ok((
            model,
            AppliedQuantization {
                approach,
                dtype: settings.dtype(),
                scheme: settings.scheme(),
                granularity: settings.granularity(),
                quantized_ops,
                fallback_ops,
                activation_ranges,
                tuning: TuningSummary {
                    strategy: tuning_config.strategy,
                    baseline,
                    final_metric: metric,
                    trials,
                },
            },
        ))
    }
}

/// Replace `ops` with int8 weights.
fn quantize_ops<'o>(
    settings: &QuantizationConfig,
    model: &mut Model,
    ops: impl IntoIterator<Item = &'o String>,
) {
    for op in ops {
        if let Some(weight) = model.weight_mut(op) {
            let values = weight.to_f32_vec();
            let shape = weight.shape().to_vec();
            *weight = Weight::Int8(quantize_tensor(
                &values,
                &shape,
                settings.granularity(),
                settings.scheme(),
            ));
        }
    }
}

/// Round `ops` through the int8 grid, keeping them float.
fn fake_quantize_ops(settings: &QuantizationConfig, model: &mut Model, ops: &[String]) -> Result<()> {
    for op in ops {
        if let Some(weight) = model.weight_mut(op) {
            let shape = weight.shape().to_vec();
            let values =
                fake_quantize(&weight.to_f32_vec(), &shape, settings.granularity(), settings.scheme());
            *weight = Weight::from_vec(&shape, values)?;
        }
    }
    Ok(())
}
