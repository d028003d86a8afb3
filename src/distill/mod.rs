//! Knowledge distillation
//!
//! A [`Distiller`] trains the session's model against a frozen teacher by
//! calling the caller's distillation step once per epoch. [`DistillationLoss`]
//! is the usual soft-target loss for writing that step.

mod distiller;
mod loss;

#[cfg(test)]
mod tests;

pub use distiller::Distiller;
pub use loss::DistillationLoss;
