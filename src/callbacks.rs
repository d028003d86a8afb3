//! Caller-supplied evaluation, training and distillation steps.
//!
//! Each callback receives the model it should act on. Plain closures work
//! through blanket impls; wrap a closure returning `Result` in [`Fallible`]
//! to report failures.

use crate::error::Result;
use crate::model::Model;

/// Maps a candidate model to a scalar quality metric.
pub trait EvaluationFunction {
    fn evaluate(&mut self, model: &Model) -> Result<f32>;
}

impl<F> EvaluationFunction for F
where
    F: FnMut(&Model) -> f32,
{
    fn evaluate(&mut self, model: &Model) -> Result<f32> {
        Ok(self(model))
    }
}

/// One fine-tuning pass over a model.
pub trait TrainingFunction {
    fn train(&mut self, model: &mut Model, epoch: usize) -> Result<()>;
}

impl<F> TrainingFunction for F
where
    F: FnMut(&mut Model, usize),
{
    fn train(&mut self, model: &mut Model, epoch: usize) -> Result<()> {
        self(model, epoch);
        Ok(())
    }
}

/// Settings for one distillation epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistillContext {
    pub epoch: usize,
    pub temperature: f32,
    pub alpha: f32,
}

/// One epoch of training `student` against a frozen `teacher`.
pub trait DistillationFunction {
    fn distill(&mut self, student: &mut Model, teacher: &Model, ctx: &DistillContext) -> Result<()>;
}

impl<F> DistillationFunction for F
where
    F: FnMut(&mut Model, &Model, &DistillContext),
{
    fn distill(&mut self, student: &mut Model, teacher: &Model, ctx: &DistillContext) -> Result<()> {
        self(student, teacher, ctx);
        Ok(())
    }
}

/// Adapter for closures that return `Result`.
///
/// ```
/// use comprimir::callbacks::{EvaluationFunction, Fallible};
/// use comprimir::{Error, Model};
///
/// let mut eval = Fallible(|_: &Model| Err::<f32, _>(Error::callback("dataset missing")));
/// assert!(eval.evaluate(&Model::default()).is_err());
/// ```
pub struct Fallible<F>(pub F);

impl<F> EvaluationFunction for Fallible<F>
where
    F: FnMut(&Model) -> Result<f32>,
{
    fn evaluate(&mut self, model: &Model) -> Result<f32> {
        (self.0)(model)
    }
}

impl<F> TrainingFunction for Fallible<F>
where
    F: FnMut(&mut Model, usize) -> Result<()>,
{
    fn train(&mut self, model: &mut Model, epoch: usize) -> Result<()> {
        (self.0)(model, epoch)
    }
}

impl<F> DistillationFunction for Fallible<F>
where
    F: FnMut(&mut Model, &Model, &DistillContext) -> Result<()>,
{
    fn distill(&mut self, student: &mut Model, teacher: &Model, ctx: &DistillContext) -> Result<()> {
        (self.0)(student, teacher, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_closure_evaluation() {
        let mut calls = 0;
        let mut eval = |_: &Model| {
            calls += 1;
            0.5f32
        };
        assert_eq!(eval.evaluate(&Model::default()).unwrap(), 0.5);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_fallible_training_propagates() {
        let mut train = Fallible(|_: &mut Model, epoch: usize| {
            if epoch == 1 {
                Err(Error::callback("diverged"))
            } else {
                Ok(())
            }
        });
        let mut model = Model::default();
        assert!(train.train(&mut model, 0).is_ok());
        assert!(matches!(train.train(&mut model, 1), Err(Error::Callback { .. })));
    }

    #[test]
    fn test_closure_distillation_sees_context() {
        let mut seen = Vec::new();
        let mut step = |_: &mut Model, _: &Model, ctx: &DistillContext| seen.push(ctx.epoch);
        let ctx = DistillContext { epoch: 3, temperature: 2.0, alpha: 0.5 };
        step.distill(&mut Model::default(), &Model::default(), &ctx).unwrap();
        assert_eq!(seen, vec![3]);
    }
}
