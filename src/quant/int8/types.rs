//! Quantization scheme and granularity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping between float range and the int8 grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantScheme {
    /// Zero-point fixed at 0, grid `[-127, 127]`.
    #[default]
    Sym,
    /// Zero-point chosen so `[min, max]` spans `[-128, 127]`.
    Asym,
}

/// How many scale/zero-point pairs a tensor gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantGranularity {
    #[default]
    PerTensor,
    /// One pair per slice along axis 0 (output channels of a weight).
    PerChannel,
}

impl fmt::Display for QuantScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuantScheme::Sym => "sym",
            QuantScheme::Asym => "asym",
        })
    }
}

impl fmt::Display for QuantGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuantGranularity::PerTensor => "per_tensor",
            QuantGranularity::PerChannel => "per_channel",
        })
    }
}
