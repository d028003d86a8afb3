//! Scale and zero-point selection from observed ranges.

use super::{QuantGranularity, QuantParams, QuantScheme};

pub(crate) const QMIN: i32 = -128;
pub(crate) const QMAX: i32 = 127;
const MIN_SCALE: f32 = 1e-10;

/// Scale and zero-point covering `[min, max]`.
///
/// The asymmetric range is widened to include 0 so that zero (padding,
/// pruned weights) is exactly representable.
pub fn params_from_range(min: f32, max: f32, scheme: QuantScheme) -> (f32, i32) {
    match scheme {
        QuantScheme::Sym => {
            let max_abs = min.abs().max(max.abs());
            ((max_abs / QMAX as f32).max(MIN_SCALE), 0)
        }
        QuantScheme::Asym => {
            let min = min.min(0.0);
            let max = max.max(0.0);
            let scale = ((max - min) / (QMAX - QMIN) as f32).max(MIN_SCALE);
            let zero_point = (QMIN as f32 - min / scale).round() as i32;
            (scale, zero_point.clamp(QMIN, QMAX))
        }
    }
}

fn min_max(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Per-tensor parameters.
pub fn calibrate_per_tensor(values: &[f32], scheme: QuantScheme) -> QuantParams {
    let (min, max) = min_max(values);
    let (scale, zero_point) = params_from_range(min, max, scheme);
    QuantParams {
        scales: vec![scale],
        zero_points: vec![zero_point],
        scheme,
        granularity: QuantGranularity::PerTensor,
    }
}

/// Per-channel parameters for row-major `values` with `num_channels` rows.
pub fn calibrate_per_channel(
    values: &[f32],
    num_channels: usize,
    scheme: QuantScheme,
) -> QuantParams {
    if num_channels == 0 || values.is_empty() || values.len() % num_channels != 0 {
        let mut params = calibrate_per_tensor(values, scheme);
        params.granularity = QuantGranularity::PerChannel;
        return params;
    }

    let (scales, zero_points) = values
        .chunks_exact(values.len() / num_channels)
        .map(|channel| {
            let (min, max) = min_max(channel);
            params_from_range(min, max, scheme)
        })
        .unzip();

    QuantParams { scales, zero_points, scheme, granularity: QuantGranularity::PerChannel }
}
