//! Snapshot of what a session actually applied.
//!
//! Written as `best_configure.yml` next to the optimized weights and read
//! back by the loaders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{PruneMethod, QuantApproach, QuantDtype, TuningStrategy};
use crate::error::{Error, Result};
use crate::quant::int8::{QuantGranularity, QuantScheme};
use crate::quant::ActivationRange;

/// File name of the effective config inside a saved directory.
pub const EFFECTIVE_CONFIG_FILE: &str = "best_configure.yml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Identifier the session's config was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distillation: Option<AppliedDistillation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruning: Option<AppliedPruning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<AppliedQuantization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedQuantization {
    pub approach: QuantApproach,
    pub dtype: QuantDtype,
    pub scheme: QuantScheme,
    pub granularity: QuantGranularity,
    /// Weights stored as int8, in model order.
    pub quantized_ops: Vec<String>,
    /// Eligible weights kept in fp32 by the tuning search or for lack of
    /// calibration data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_ops: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub activation_ranges: BTreeMap<String, ActivationRange>,
    pub tuning: TuningSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningSummary {
    pub strategy: TuningStrategy,
    pub baseline: f32,
    pub final_metric: f32,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPruning {
    pub method: PruneMethod,
    pub schedule: String,
    pub target_sparsity: f32,
    /// Zeroed fraction over all pruned weights.
    pub achieved_sparsity: f32,
    pub layer_sparsity: BTreeMap<String, f32>,
    pub metric: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDistillation {
    pub temperature: f32,
    pub alpha: f32,
    pub num_epochs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    pub metric: f32,
}

impl EffectiveConfig {
    pub fn approach(&self) -> Option<QuantApproach> {
        self.quantization.as_ref().map(|q| q.approach)
    }

    pub fn sparsity(&self) -> Option<f32> {
        self.pruning.as_ref().map(|p| p.target_sparsity)
    }

    pub fn is_empty(&self) -> bool {
        self.quantization.is_none() && self.pruning.is_none() && self.distillation.is_none()
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Serialization { message: format!("effective config: {e}") })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found("effective config", path.display().to_string())
            } else {
                Error::io(format!("reading {}", path.display()), e)
            }
        })?;
        serde_yaml::from_str(&text)
            .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)
            .map_err(|e| Error::io(format!("writing {}", path.display()), e))
    }
}
