//! Quantize, dequantize and fake-quantize.

use super::calibrate::{QMAX, QMIN};
use super::{
    calibrate_per_channel, calibrate_per_tensor, QuantGranularity, QuantParams, QuantScheme,
    QuantizedTensor,
};

fn grid(scheme: QuantScheme) -> (f32, f32) {
    match scheme {
        QuantScheme::Sym => (-(QMAX as f32), QMAX as f32),
        QuantScheme::Asym => (QMIN as f32, QMAX as f32),
    }
}

/// Quantize `values` with precomputed parameters.
pub fn quantize_with_params(values: &[f32], params: &QuantParams) -> Vec<i8> {
    let (lo, hi) = grid(params.scheme);
    let numel = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let (scale, zero_point) = params.group(i, numel);
            (v / scale + zero_point as f32).round().clamp(lo, hi) as i8
        })
        .collect()
}

pub fn dequantize_with_params(quantized: &[i8], params: &QuantParams) -> Vec<f32> {
    let numel = quantized.len();
    quantized
        .iter()
        .enumerate()
        .map(|(i, &q)| {
            let (scale, zero_point) = params.group(i, numel);
            (i32::from(q) - zero_point) as f32 * scale
        })
        .collect()
}

/// Calibrate from the weights themselves and quantize.
///
/// Per-channel splits along axis 0; a rank-0 tensor is treated as one channel.
pub fn quantize_tensor(
    values: &[f32],
    shape: &[usize],
    granularity: QuantGranularity,
    scheme: QuantScheme,
) -> QuantizedTensor {
    let params = match granularity {
        QuantGranularity::PerTensor => calibrate_per_tensor(values, scheme),
        QuantGranularity::PerChannel => {
            calibrate_per_channel(values, shape.first().copied().unwrap_or(1), scheme)
        }
    };
    let data = quantize_with_params(values, &params);
    QuantizedTensor { data, shape: shape.to_vec(), params }
}

/// Quantize then dequantize, returning the values the int8 model would see.
pub fn fake_quantize(
    values: &[f32],
    shape: &[usize],
    granularity: QuantGranularity,
    scheme: QuantScheme,
) -> Vec<f32> {
    quantize_tensor(values, shape, granularity, scheme).dequantize()
}
