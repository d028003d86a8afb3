//! Soft-target loss for distillation steps.

use ndarray::{Array2, Axis};

use crate::callbacks::DistillContext;
use crate::error::{Error, Result};

/// Temperature-scaled distillation loss.
///
/// ```text
/// L = α * T² * KL(softmax(teacher/T) || softmax(student/T))
///   + (1-α) * CE(student, labels)
/// ```
///
/// Built from the [`DistillContext`] a distillation step receives:
///
/// ```
/// use comprimir::callbacks::DistillContext;
/// use comprimir::distill::DistillationLoss;
/// use ndarray::array;
///
/// let ctx = DistillContext { epoch: 0, temperature: 2.0, alpha: 0.7 };
/// let loss = DistillationLoss::from_context(&ctx)
///     .forward(&array![[2.0, 1.0, 0.5]], &array![[1.5, 1.2, 0.8]], &[0])
///     .unwrap();
/// assert!(loss > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistillationLoss {
    pub temperature: f32,
    pub alpha: f32,
}

impl DistillationLoss {
    pub fn from_context(ctx: &DistillContext) -> Self {
        Self { temperature: ctx.temperature, alpha: ctx.alpha }
    }

    /// # Errors
    ///
    /// `IncompatibleConfig` when logits shapes differ or the label count does
    /// not match the batch size.
    pub fn forward(
        &self,
        student_logits: &Array2<f32>,
        teacher_logits: &Array2<f32>,
        labels: &[usize],
    ) -> Result<f32> {
        if student_logits.shape() != teacher_logits.shape() {
            return Err(Error::IncompatibleConfig {
                expected: format!("teacher logits of shape {:?}", student_logits.shape()),
                found: format!("{:?}", teacher_logits.shape()),
            });
        }
        if student_logits.nrows() != labels.len() {
            return Err(Error::IncompatibleConfig {
                expected: format!("{} labels", student_logits.nrows()),
                found: labels.len().to_string(),
            });
        }

        let t = self.temperature;
        let soft = kl_divergence(&softmax_2d(&(teacher_logits / t)), &softmax_2d(&(student_logits / t)));
        let hard = cross_entropy(student_logits, labels);
        Ok(self.alpha * soft * t * t + (1.0 - self.alpha) * hard)
    }
}

fn cross_entropy(logits: &Array2<f32>, labels: &[usize]) -> f32 {
    let probs = softmax_2d(logits);
    let total: f32 = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs.get([i, label]).copied().unwrap_or(0.0).max(1e-10).ln())
        .sum();
    total / labels.len().max(1) as f32
}

/// Row-wise softmax.
fn softmax_2d(x: &Array2<f32>) -> Array2<f32> {
    let mut result = x.clone();
    for mut row in result.axis_iter_mut(Axis(0)) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum: f32 = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    result
}

/// KL(p || q), averaged over rows.
fn kl_divergence(p: &Array2<f32>, q: &Array2<f32>) -> f32 {
    let total: f32 = p
        .axis_iter(Axis(0))
        .zip(q.axis_iter(Axis(0)))
        .map(|(p_row, q_row)| {
            p_row
                .iter()
                .zip(q_row.iter())
                .filter(|(p_i, _)| **p_i > 1e-10)
                .map(|(&p_i, &q_i)| p_i * (p_i / q_i.max(1e-10)).ln())
                .sum::<f32>()
        })
        .sum();
    total / p.nrows().max(1) as f32
}
