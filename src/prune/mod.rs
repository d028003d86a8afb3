//! Magnitude pruning driven by an epoch schedule.
//!
//! Each epoch the [`Pruner`] may grow the masks to the scheduled sparsity,
//! then calls the training function once and reapplies the masks.

pub mod magnitude;
mod metrics;
mod pruner;

pub use metrics::PruningMetrics;
pub use pruner::Pruner;
