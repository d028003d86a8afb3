//! Accuracy-driven tuning settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order in which ops fall back to fp32 when a trial misses the criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TuningStrategy {
    /// Last op first.
    #[default]
    Basic,
    /// Op with the largest quantization error first.
    Mse,
}

/// Allowed metric loss relative to the fp32 baseline.
///
/// Exactly one of `relative` or `absolute` may be set; neither means a
/// relative tolerance of 1%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccuracyCriterion {
    #[serde(default = "default_true")]
    pub higher_is_better: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute: Option<f32>,
}

fn default_true() -> bool {
    true
}

const DEFAULT_RELATIVE: f32 = 0.01;

impl Default for AccuracyCriterion {
    fn default() -> Self {
        Self { higher_is_better: true, relative: Some(DEFAULT_RELATIVE), absolute: None }
    }
}

impl AccuracyCriterion {
    pub fn relative(tolerance: f32) -> Self {
        Self { higher_is_better: true, relative: Some(tolerance), absolute: None }
    }

    pub fn absolute(tolerance: f32) -> Self {
        Self { higher_is_better: true, relative: None, absolute: Some(tolerance) }
    }

    #[must_use]
    pub fn lower_is_better(mut self) -> Self {
        self.higher_is_better = false;
        self
    }

    /// Worst metric still accepted for a given baseline.
    pub fn threshold(&self, baseline: f32) -> f32 {
        let margin = match (self.relative, self.absolute) {
            (_, Some(abs)) => abs,
            (Some(rel), None) => baseline.abs() * rel,
            (None, None) => baseline.abs() * DEFAULT_RELATIVE,
        };
        if self.higher_is_better {
            baseline - margin
        } else {
            baseline + margin
        }
    }

    pub fn accepts(&self, baseline: f32, metric: f32) -> bool {
        if !metric.is_finite() {
            return false;
        }
        let threshold = self.threshold(baseline);
        if self.higher_is_better {
            metric >= threshold
        } else {
            metric <= threshold
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match (self.relative, self.absolute) {
            (Some(_), Some(_)) => {
                Err("accuracy_criterion sets both relative and absolute".to_string())
            }
            (Some(t), None) | (None, Some(t)) if !(t >= 0.0 && t.is_finite()) => {
                Err(format!("accuracy_criterion tolerance ({t}) must be a non-negative number"))
            }
            _ => Ok(()),
        }
    }
}

/// Budget of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExitPolicy {
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
    /// Wall-clock budget in seconds; 0 means unbounded.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_max_trials() -> usize {
    100
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self { max_trials: default_max_trials(), timeout_secs: 0 }
    }
}

impl ExitPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
    #[serde(default)]
    pub strategy: TuningStrategy,
    #[serde(default)]
    pub accuracy_criterion: AccuracyCriterion,
    #[serde(default)]
    pub exit_policy: ExitPolicy,
}

impl TuningConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.accuracy_criterion.validate()?;
        if self.exit_policy.max_trials == 0 {
            return Err("exit_policy.max_trials must be at least 1".to_string());
        }
        Ok(())
    }
}
