//! Optimization configs and their loader.

mod distillation;
mod loader;
mod optimization;
mod pruning;
mod quantization;
mod schedule;
mod tuning;

pub use distillation::DistillationConfig;
pub use loader::ConfigLoader;
pub use optimization::OptimizationConfig;
pub use pruning::{PruneMethod, PruningConfig};
pub use quantization::{
    CalibrationConfig, CalibrationMethod, QuantApproach, QuantDtype, QuantizationConfig,
};
pub use schedule::PruningSchedule;
pub use tuning::{AccuracyCriterion, ExitPolicy, TuningConfig, TuningStrategy};

pub use crate::quant::int8::{QuantGranularity, QuantScheme};
