//! Pruning sessions.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::magnitude::{apply_mask, magnitude_mask};
use super::PruningMetrics;
use crate::callbacks::{EvaluationFunction, TrainingFunction};
use crate::config::{OptimizationConfig, PruningConfig};
use crate::effective::AppliedPruning;
use crate::error::{Error, Result};
use crate::model::{Model, Weight};

/// Pruning settings plus evaluation and training callbacks.
///
/// `train` runs once per epoch; masks are reapplied after every call so the
/// training step cannot revive pruned weights.
pub struct Pruner<'a> {
    config: OptimizationConfig,
    settings: PruningConfig,
    eval: Box<dyn EvaluationFunction + 'a>,
    train: Box<dyn TrainingFunction + 'a>,
}

impl std::fmt::Debug for Pruner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pruner").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<'a> Pruner<'a> {
    /// # Errors
    ///
    /// `MalformedConfig` if `config` has no pruning section.
    pub fn new(
        config: &OptimizationConfig,
        eval: impl EvaluationFunction + 'a,
        train: impl TrainingFunction + 'a,
    ) -> Result<Self> {
        let settings = config.pruning().cloned().ok_or_else(|| {
            Error::malformed(config.source().unwrap_or("<in-memory>"), "no pruning section")
        })?;
        Ok(Self { config: config.clone(), settings, eval: Box::new(eval), train: Box::new(train) })
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Float weights selected by the config, in model order.
    ///
    /// Explicit `names` are taken as given; otherwise only weights of rank ≥ 2
    /// are pruned.
    fn targets(&self, model: &Model) -> Result<Vec<String>> {
        for name in self.settings.names() {
            if model.weight(name).is_none() {
                return Err(Error::IncompatibleConfig {
                    expected: format!("weight '{name}' listed in pruning.names"),
                    found: "no such weight in the model".to_string(),
                });
            }
        }
        Ok(model
            .weights()
            .filter(|(name, weight)| {
                // Without explicit names, rank-1 scales and biases are left alone.
                let selected = self.settings.targets(name)
                    && (!self.settings.names().is_empty() || weight.shape().len() >= 2);
                if selected && weight.is_quantized() {
                    warn!(weight = *name, "skipping int8 weight");
                }
                selected && !weight.is_quantized()
            })
            .map(|(name, _)| name.to_string())
            .collect())
    }

    pub(crate) fn check_ready(&self, model: &Model) -> Result<()> {
        self.targets(model).map(|_| ())
    }

    fn prune_to(
        model: &mut Model,
        targets: &[String],
        sparsity: f32,
        masks: &mut BTreeMap<String, Vec<bool>>,
    ) {
        for name in targets {
            if let Some(array) = model.weight_mut(name).and_then(Weight::as_float_mut) {
                let mut values: Vec<f32> = array.iter().copied().collect();
                let mask = magnitude_mask(&values, sparsity, masks.get(name).map(Vec::as_slice));
                apply_mask(&mut values, &mask);
                array.iter_mut().zip(values).for_each(|(dst, v)| *dst = v);
                masks.insert(name.clone(), mask);
            }
        }
    }

    fn reapply(model: &mut Model, masks: &BTreeMap<String, Vec<bool>>) {
        for (name, mask) in masks {
            if let Some(array) = model.weight_mut(name).and_then(Weight::as_float_mut) {
                array.iter_mut().zip(mask).filter(|(_, m)| **m).for_each(|(v, _)| *v = 0.0);
            }
        }
    }

    /// Run the pruning schedule over `model`.
    pub(crate) fn run(&mut self, mut model: Model) -> Result<(Model, AppliedPruning)> {
        let targets = self.targets(&model)?;
        if targets.is_empty() {
            warn!("no weights selected for pruning");
        }

        let settings = &self.settings;
        let schedule = settings.schedule();
        let target = settings.target_sparsity();
        info!(
            schedule = schedule.display_name(),
            target,
            epochs = settings.num_epochs(),
            weights = targets.len(),
            "pruning started"
        );

        let mut masks = BTreeMap::new();
        let mut metrics = PruningMetrics::new(target);
        for epoch in 0..settings.num_epochs() {
            if schedule.should_prune_at_epoch(epoch) {
                let sparsity = schedule.sparsity_at_epoch(epoch, target);
                Self::prune_to(&mut model, &targets, sparsity, &mut masks);
                metrics.pruning_epochs.push(epoch);
                debug!(epoch, sparsity, "masks updated");
            }
            self.train.train(&mut model, epoch)?;
            Self::reapply(&mut model, &masks);
        }
        Self::prune_to(&mut model, &targets, target, &mut masks);

        for name in &targets {
            if let Some(weight) = model.weight(name) {
                let zeros = weight.to_f32_vec().iter().filter(|v| **v == 0.0).count();
                metrics.add_layer(name.clone(), zeros, weight.numel());
            }
        }

        let metric = self.eval.evaluate(&model)?;
        info!(achieved = metrics.achieved_sparsity(), metric, "pruning finished");
        Ok((model, metrics.into_applied(&self.settings, metric)))
    }
}
