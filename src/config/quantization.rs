//! Quantization section of an optimization config.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quant::int8::{QuantGranularity, QuantScheme};

/// When quantization parameters are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuantApproach {
    /// Weights quantized ahead of time, activation ranges computed at run time.
    #[default]
    #[serde(rename = "post_training_dynamic_quant")]
    Dynamic,
    /// Weights and activation ranges fixed ahead of time from calibration data.
    #[serde(rename = "post_training_static_quant")]
    Static,
    /// Fine-tuning with fake-quantized weights before conversion.
    #[serde(rename = "quant_aware_training")]
    AwareTraining,
}

impl QuantApproach {
    /// Short name: `dynamic`, `static` or `aware_training`.
    pub fn short_name(&self) -> &'static str {
        match self {
            QuantApproach::Dynamic => "dynamic",
            QuantApproach::Static => "static",
            QuantApproach::AwareTraining => "aware_training",
        }
    }

    pub fn requires_calibration(&self) -> bool {
        matches!(self, QuantApproach::Static)
    }

    pub fn requires_training(&self) -> bool {
        matches!(self, QuantApproach::AwareTraining)
    }
}

impl fmt::Display for QuantApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuantApproach::Dynamic => "post_training_dynamic_quant",
            QuantApproach::Static => "post_training_static_quant",
            QuantApproach::AwareTraining => "quant_aware_training",
        })
    }
}

/// Target integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantDtype {
    #[default]
    Int8,
}

impl fmt::Display for QuantDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("int8")
    }
}

/// How activation ranges are derived from calibration samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    #[default]
    MinMax,
    /// Symmetric percentile clipping, robust to outliers.
    Percentile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Maximum number of batches observed per op.
    #[serde(default = "default_sampling_size")]
    pub sampling_size: usize,
    #[serde(default)]
    pub method: CalibrationMethod,
    /// Upper percentile for [`CalibrationMethod::Percentile`].
    #[serde(default = "default_percentile")]
    pub percentile: f32,
}

fn default_sampling_size() -> usize {
    100
}

fn default_percentile() -> f32 {
    99.99
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sampling_size: default_sampling_size(),
            method: CalibrationMethod::default(),
            percentile: default_percentile(),
        }
    }
}

/// Configuration for a quantization session.
///
/// # Example
///
/// ```
/// use comprimir::config::{QuantApproach, QuantizationConfig};
///
/// let config = QuantizationConfig::new(QuantApproach::Dynamic).with_excluded_ops(["classifier"]);
/// assert_eq!(config.approach().short_name(), "dynamic");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantizationConfig {
    #[serde(default)]
    approach: QuantApproach,
    #[serde(default)]
    dtype: QuantDtype,
    #[serde(default)]
    scheme: QuantScheme,
    #[serde(default)]
    granularity: QuantGranularity,
    #[serde(default)]
    calibration: CalibrationConfig,
    /// Substring patterns of weights kept in fp32.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    excluded_ops: Vec<String>,
    /// Fine-tuning epochs for quantization-aware training.
    #[serde(default = "default_train_epochs")]
    train_epochs: usize,
}

fn default_train_epochs() -> usize {
    1
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            approach: QuantApproach::default(),
            dtype: QuantDtype::default(),
            scheme: QuantScheme::default(),
            granularity: QuantGranularity::default(),
            calibration: CalibrationConfig::default(),
            excluded_ops: Vec::new(),
            train_epochs: default_train_epochs(),
        }
    }
}

impl QuantizationConfig {
    pub fn new(approach: QuantApproach) -> Self {
        Self { approach, ..Self::default() }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: QuantScheme) -> Self {
        self.scheme = scheme;
        self
    }

    #[must_use]
    pub fn with_granularity(mut self, granularity: QuantGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    #[must_use]
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    #[must_use]
    pub fn with_excluded_ops<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_ops = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_train_epochs(mut self, epochs: usize) -> Self {
        self.train_epochs = epochs;
        self
    }

    pub fn approach(&self) -> QuantApproach {
        self.approach
    }

    pub fn dtype(&self) -> QuantDtype {
        self.dtype
    }

    pub fn scheme(&self) -> QuantScheme {
        self.scheme
    }

    pub fn granularity(&self) -> QuantGranularity {
        self.granularity
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    pub fn excluded_ops(&self) -> &[String] {
        &self.excluded_ops
    }

    pub fn train_epochs(&self) -> usize {
        self.train_epochs
    }

    /// Whether `name` matches an `excluded_ops` pattern.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_ops.iter().any(|p| name.contains(p.as_str()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.approach.requires_calibration() && self.calibration.sampling_size == 0 {
            return Err("calibration.sampling_size must be at least 1 for static quantization".into());
        }
        let p = self.calibration.percentile;
        if !(p > 50.0 && p <= 100.0) {
            return Err(format!("calibration.percentile ({p}) must be in (50, 100]"));
        }
        if self.approach.requires_training() && self.train_epochs == 0 {
            return Err("train_epochs must be at least 1 for quant_aware_training".into());
        }
        Ok(())
    }
}
