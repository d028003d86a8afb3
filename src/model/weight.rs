//! Named model weights, float or int8.

use ndarray::{ArrayD, IxDyn};

use crate::error::{Error, Result};
use crate::quant::int8::QuantizedTensor;

/// One weight tensor of a [`Model`](super::Model).
#[derive(Debug, Clone, PartialEq)]
pub enum Weight {
    Float(ArrayD<f32>),
    Int8(QuantizedTensor),
}

impl Weight {
    /// Float weight from row-major data.
    pub fn from_vec(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data).map(Weight::Float).map_err(|e| {
            Error::Serialization { message: format!("shape {shape:?} does not fit data: {e}") }
        })
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Weight::Float(array) => array.shape(),
            Weight::Int8(q) => &q.shape,
        }
    }

    pub fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, Weight::Int8(_))
    }

    pub fn as_float(&self) -> Option<&ArrayD<f32>> {
        match self {
            Weight::Float(array) => Some(array),
            Weight::Int8(_) => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut ArrayD<f32>> {
        match self {
            Weight::Float(array) => Some(array),
            Weight::Int8(_) => None,
        }
    }

    /// Row-major float values; int8 weights are dequantized.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            Weight::Float(array) => array.iter().copied().collect(),
            Weight::Int8(q) => q.dequantize(),
        }
    }

    /// Fraction of elements that are exactly zero.
    pub fn sparsity(&self) -> f32 {
        let numel = self.numel();
        if numel == 0 {
            return 0.0;
        }
        let zeros = match self {
            Weight::Float(array) => array.iter().filter(|v| **v == 0.0).count(),
            Weight::Int8(q) => q.dequantize().iter().filter(|v| **v == 0.0).count(),
        };
        zeros as f32 / numel as f32
    }

    /// Size in bytes when stored.
    pub fn memory_bytes(&self) -> usize {
        match self {
            Weight::Float(array) => array.len() * 4,
            Weight::Int8(q) => q.memory_bytes(),
        }
    }
}
