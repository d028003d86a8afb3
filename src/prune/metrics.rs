//! Sparsity bookkeeping for a pruning session.

use std::collections::BTreeMap;

use crate::config::PruningConfig;
use crate::effective::AppliedPruning;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruningMetrics {
    pub target_sparsity: f32,
    pub total_parameters: usize,
    pub parameters_pruned: usize,
    pub layer_sparsity: BTreeMap<String, f32>,
    /// Epochs at which masks were recomputed.
    pub pruning_epochs: Vec<usize>,
}

impl PruningMetrics {
    pub fn new(target_sparsity: f32) -> Self {
        Self { target_sparsity, ..Default::default() }
    }

    pub fn add_layer(&mut self, name: impl Into<String>, zeros: usize, total: usize) {
        self.total_parameters += total;
        self.parameters_pruned += zeros;
        let sparsity = if total > 0 { zeros as f32 / total as f32 } else { 0.0 };
        self.layer_sparsity.insert(name.into(), sparsity);
    }

    pub fn achieved_sparsity(&self) -> f32 {
        if self.total_parameters == 0 {
            0.0
        } else {
            self.parameters_pruned as f32 / self.total_parameters as f32
        }
    }

    pub fn parameters_remaining(&self) -> usize {
        self.total_parameters.saturating_sub(self.parameters_pruned)
    }

    pub(crate) fn into_applied(self, config: &PruningConfig, metric: f32) -> AppliedPruning {
        AppliedPruning {
            method: config.method(),
            schedule: config.schedule().display_name().to_string(),
            target_sparsity: self.target_sparsity,
            achieved_sparsity: self.achieved_sparsity(),
            layer_sparsity: self.layer_sparsity,
            metric,
        }
    }
}
