//! Epoch-based sparsity schedules.
//!
//! - OneShot: reach the target at a single epoch
//! - Gradual: linear interpolation from an initial sparsity to the target
//! - Cubic: `s_t = s_f * (1 - (1 - t/T)^3)`, fast early pruning that slows
//!   as the target approaches (Zhu & Gupta, 2017)

use serde::{Deserialize, Serialize};

/// When sparsity increases during a pruning session.
///
/// Every variant ends at the owning config's `target_sparsity`.
///
/// # Example
///
/// ```
/// use comprimir::config::PruningSchedule;
///
/// let gradual = PruningSchedule::Gradual {
///     start_epoch: 1,
///     end_epoch: 5,
///     initial_sparsity: 0.0,
///     frequency: 1,
/// };
/// assert_eq!(gradual.sparsity_at_epoch(0, 0.5), 0.0);
/// assert_eq!(gradual.sparsity_at_epoch(5, 0.5), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PruningSchedule {
    OneShot {
        #[serde(default)]
        epoch: usize,
    },
    Gradual {
        start_epoch: usize,
        end_epoch: usize,
        #[serde(default)]
        initial_sparsity: f32,
        #[serde(default = "default_frequency")]
        frequency: usize,
    },
    Cubic {
        start_epoch: usize,
        end_epoch: usize,
        #[serde(default = "default_frequency")]
        frequency: usize,
    },
}

fn default_frequency() -> usize {
    1
}

impl Default for PruningSchedule {
    fn default() -> Self {
        PruningSchedule::OneShot { epoch: 0 }
    }
}

impl PruningSchedule {
    /// Scheduled sparsity at `epoch` for a session ending at `target`.
    ///
    /// Never exceeds `target` and never decreases with `epoch`.
    pub fn sparsity_at_epoch(&self, epoch: usize, target: f32) -> f32 {
        match *self {
            PruningSchedule::OneShot { epoch: at } => {
                if epoch >= at {
                    target
                } else {
                    0.0
                }
            }
            PruningSchedule::Gradual { start_epoch, end_epoch, initial_sparsity, .. } => {
                if epoch < start_epoch {
                    0.0
                } else if epoch >= end_epoch {
                    target
                } else {
                    let progress = (epoch - start_epoch) as f32 / (end_epoch - start_epoch) as f32;
                    let initial = initial_sparsity.min(target);
                    initial + (target - initial) * progress
                }
            }
            PruningSchedule::Cubic { start_epoch, end_epoch, .. } => {
                if epoch < start_epoch {
                    0.0
                } else if epoch >= end_epoch {
                    target
                } else {
                    let remaining =
                        1.0 - (epoch - start_epoch) as f32 / (end_epoch - start_epoch) as f32;
                    target * (1.0 - remaining.powi(3))
                }
            }
        }
    }

    /// Whether masks are recomputed at `epoch`.
    ///
    /// The end epoch always prunes so the target is reached on schedule.
    pub fn should_prune_at_epoch(&self, epoch: usize) -> bool {
        match *self {
            PruningSchedule::OneShot { epoch: at } => epoch == at,
            PruningSchedule::Gradual { start_epoch, end_epoch, frequency, .. }
            | PruningSchedule::Cubic { start_epoch, end_epoch, frequency } => {
                epoch >= start_epoch
                    && epoch <= end_epoch
                    && ((epoch - start_epoch) % frequency.max(1) == 0 || epoch == end_epoch)
            }
        }
    }

    /// Epoch at which the target is reached.
    pub fn end_epoch(&self) -> usize {
        match *self {
            PruningSchedule::OneShot { epoch } => epoch,
            PruningSchedule::Gradual { end_epoch, .. } | PruningSchedule::Cubic { end_epoch, .. } => {
                end_epoch
            }
        }
    }

    /// Number of epochs that recompute masks.
    pub fn num_pruning_steps(&self) -> usize {
        (0..=self.end_epoch()).filter(|e| self.should_prune_at_epoch(*e)).count()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PruningSchedule::OneShot { .. } => "one_shot",
            PruningSchedule::Gradual { .. } => "gradual",
            PruningSchedule::Cubic { .. } => "cubic",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match *self {
            PruningSchedule::OneShot { .. } => Ok(()),
            PruningSchedule::Gradual { start_epoch, end_epoch, initial_sparsity, frequency } => {
                Self::validate_window(start_epoch, end_epoch, frequency)?;
                if !(0.0..=1.0).contains(&initial_sparsity) {
                    return Err(format!(
                        "initial_sparsity ({initial_sparsity}) must be between 0.0 and 1.0"
                    ));
                }
                Ok(())
            }
            PruningSchedule::Cubic { start_epoch, end_epoch, frequency } => {
                Self::validate_window(start_epoch, end_epoch, frequency)
            }
        }
    }

    fn validate_window(start: usize, end: usize, frequency: usize) -> Result<(), String> {
        if end <= start {
            return Err(format!("end_epoch ({end}) must be greater than start_epoch ({start})"));
        }
        if frequency == 0 {
            return Err("frequency must be at least 1".to_string());
        }
        Ok(())
    }
}
