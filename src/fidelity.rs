//! Weight-reconstruction metric used when no task evaluation is available.

use crate::callbacks::EvaluationFunction;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::quant::int8::relative_error;

/// Scores a candidate by how closely its weights reproduce a reference model.
///
/// The score is `1 − mean relative error` over the reference's weights, so an
/// untouched model scores 1.0 and higher is better.
#[derive(Debug, Clone)]
pub struct WeightFidelity {
    reference: Model,
}

impl WeightFidelity {
    pub fn new(reference: Model) -> Self {
        Self { reference }
    }

    /// # Errors
    ///
    /// `IncompatibleConfig` if `candidate` lacks a reference weight or a
    /// shape differs.
    pub fn score(&self, candidate: &Model) -> Result<f32> {
        if self.reference.is_empty() {
            return Ok(1.0);
        }
        let mut total = 0.0;
        for (name, reference) in self.reference.weights() {
            let weight = candidate.weight(name).ok_or_else(|| Error::IncompatibleConfig {
                expected: format!("weight '{name}'"),
                found: "no such weight in the candidate".to_string(),
            })?;
            if weight.shape() != reference.shape() {
                return Err(Error::IncompatibleConfig {
                    expected: format!("'{name}' with shape {:?}", reference.shape()),
                    found: format!("{:?}", weight.shape()),
                });
            }
            total += relative_error(&reference.to_f32_vec(), &weight.to_f32_vec());
        }
        Ok(1.0 - total / self.reference.len() as f32)
    }
}

impl EvaluationFunction for WeightFidelity {
    fn evaluate(&mut self, model: &Model) -> Result<f32> {
        self.score(model)
    }
}
