//! Quantization error metrics.

/// Mean squared error between original and dequantized values.
pub fn quantization_mse(original: &[f32], dequantized: &[f32]) -> f32 {
    if original.len() != dequantized.len() || original.is_empty() {
        return f32::MAX;
    }
    let sum_sq: f32 = original.iter().zip(dequantized).map(|(a, b)| (a - b).powi(2)).sum();
    sum_sq / original.len() as f32
}

/// `‖a − b‖ / ‖a‖`, or `‖b‖` when `a` is all zeros.
pub fn relative_error(reference: &[f32], candidate: &[f32]) -> f32 {
    let diff: f32 =
        reference.iter().zip(candidate).map(|(a, b)| (a - b).powi(2)).sum::<f32>().sqrt();
    let norm: f32 = reference.iter().map(|a| a * a).sum::<f32>().sqrt();
    if norm == 0.0 {
        diff
    } else {
        diff / norm
    }
}
