//! Quantization parameters and int8 tensors.

use serde::{Deserialize, Serialize};

use super::{dequantize_with_params, QuantGranularity, QuantScheme};

/// Scale and zero-point groups for one tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scales: Vec<f32>,
    /// One per scale; all zero for [`QuantScheme::Sym`].
    pub zero_points: Vec<i32>,
    pub scheme: QuantScheme,
    pub granularity: QuantGranularity,
}

impl QuantParams {
    pub fn num_groups(&self) -> usize {
        self.scales.len()
    }

    /// Number of consecutive elements sharing one scale, for a tensor of `numel` elements.
    pub fn group_len(&self, numel: usize) -> usize {
        match self.granularity {
            QuantGranularity::PerTensor => numel.max(1),
            QuantGranularity::PerChannel => (numel / self.scales.len().max(1)).max(1),
        }
    }

    pub(crate) fn group(&self, index: usize, numel: usize) -> (f32, i32) {
        let g = index / self.group_len(numel);
        (
            self.scales.get(g).copied().unwrap_or(1.0),
            self.zero_points.get(g).copied().unwrap_or(0),
        )
    }
}

/// Int8 tensor in row-major order plus the parameters to dequantize it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizedTensor {
    pub data: Vec<i8>,
    pub shape: Vec<usize>,
    pub params: QuantParams,
}

impl QuantizedTensor {
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Bytes taken by values, scales and zero-points.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() + self.params.scales.len() * 4 + self.params.zero_points.len() * 4
    }

    pub fn dequantize(&self) -> Vec<f32> {
        dequantize_with_params(&self.data, &self.params)
    }
}
