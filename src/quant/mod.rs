//! Int8 quantization sessions.
//!
//! - [`int8`]: per-tensor / per-channel, symmetric / asymmetric int8 kernels
//! - [`calibration`]: activation ranges for static quantization
//! - [`Quantizer`]: dynamic, static and quantization-aware approaches driven
//!   by an accuracy-aware fallback search

pub mod calibration;
pub mod int8;
mod quantizer;
#[cfg(test)]
mod tests;
mod tuning;

pub use calibration::{ActivationRange, CalibrationSet, RangeObserver};
pub use quantizer::Quantizer;
