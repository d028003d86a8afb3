//! Distillation section of an optimization config.

use serde::{Deserialize, Serialize};

/// Settings handed to the caller's distillation step every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistillationConfig {
    /// Softmax temperature applied to teacher and student logits.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Weight of the distillation loss against the task loss.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_num_epochs")]
    pub num_epochs: usize,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_alpha() -> f32 {
    0.5
}

fn default_num_epochs() -> usize {
    1
}

impl Default for DistillationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            alpha: default_alpha(),
            num_epochs: default_num_epochs(),
        }
    }
}

impl DistillationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(format!("temperature ({}) must be positive", self.temperature));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha ({}) must be between 0.0 and 1.0", self.alpha));
        }
        if self.num_epochs == 0 {
            return Err("num_epochs must be at least 1".to_string());
        }
        Ok(())
    }
}
