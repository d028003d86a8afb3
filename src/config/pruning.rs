//! Pruning section of an optimization config.

use serde::{Deserialize, Serialize};

use super::PruningSchedule;

/// Criterion used to pick which weights to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PruneMethod {
    /// Smallest absolute values first.
    #[default]
    Magnitude,
}

impl PruneMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            PruneMethod::Magnitude => "magnitude",
        }
    }
}

/// Configuration for a pruning session.
///
/// # Example
///
/// ```
/// use comprimir::config::{PruningConfig, PruningSchedule};
///
/// let config = PruningConfig::default()
///     .with_target_sparsity(0.1)
///     .with_num_epochs(3)
///     .with_schedule(PruningSchedule::Cubic { start_epoch: 0, end_epoch: 2, frequency: 1 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PruningConfig {
    #[serde(default)]
    method: PruneMethod,

    /// Final fraction of zeroed elements in each target weight.
    target_sparsity: f32,

    #[serde(default)]
    schedule: PruningSchedule,

    /// Number of calls to the training function.
    #[serde(default = "default_num_epochs")]
    num_epochs: usize,

    /// Explicit weights to prune; empty means every eligible weight.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    names: Vec<String>,

    /// Substring patterns of weights never pruned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    excluded: Vec<String>,
}

fn default_num_epochs() -> usize {
    1
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            method: PruneMethod::default(),
            target_sparsity: 0.5,
            schedule: PruningSchedule::default(),
            num_epochs: default_num_epochs(),
            names: Vec::new(),
            excluded: Vec::new(),
        }
    }
}

impl PruningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, method: PruneMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the target sparsity, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_target_sparsity(mut self, sparsity: f32) -> Self {
        self.target_sparsity = sparsity.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: PruningSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_num_epochs(mut self, epochs: usize) -> Self {
        self.num_epochs = epochs;
        self
    }

    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_excluded<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn method(&self) -> PruneMethod {
        self.method
    }

    pub fn target_sparsity(&self) -> f32 {
        self.target_sparsity
    }

    pub fn schedule(&self) -> &PruningSchedule {
        &self.schedule
    }

    pub fn num_epochs(&self) -> usize {
        self.num_epochs
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Whether `name` is a pruning target under this config.
    ///
    /// Explicit `names` win; otherwise every weight whose name ends in
    /// `weight` and matches no `excluded` pattern. The pruner further skips
    /// rank-1 tensors unless they are named explicitly.
    pub fn targets(&self, name: &str) -> bool {
        if self.excluded.iter().any(|p| name.contains(p.as_str())) {
            return false;
        }
        if self.names.is_empty() {
            name.ends_with("weight")
        } else {
            self.names.iter().any(|n| n == name)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.schedule.validate()?;

        if !(0.0..=1.0).contains(&self.target_sparsity) {
            return Err(format!(
                "target_sparsity ({}) must be between 0.0 and 1.0",
                self.target_sparsity
            ));
        }
        if self.num_epochs == 0 {
            return Err("num_epochs must be at least 1".to_string());
        }
        if self.schedule.end_epoch() >= self.num_epochs {
            return Err(format!(
                "{} schedule ends at epoch {} but only {} epoch(s) are run",
                self.schedule.display_name(),
                self.schedule.end_epoch(),
                self.num_epochs
            ));
        }
        Ok(())
    }
}
