//! Distillation sessions.

use tracing::{debug, info};

use crate::callbacks::{DistillContext, DistillationFunction, EvaluationFunction};
use crate::config::{DistillationConfig, OptimizationConfig};
use crate::effective::AppliedDistillation;
use crate::error::{Error, Result};
use crate::model::Model;

/// Distillation settings, a frozen teacher and the caller's callbacks.
pub struct Distiller<'a> {
    config: OptimizationConfig,
    settings: DistillationConfig,
    teacher: Model,
    teacher_id: Option<String>,
    eval: Box<dyn EvaluationFunction + 'a>,
    step: Box<dyn DistillationFunction + 'a>,
}

impl std::fmt::Debug for Distiller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distiller")
            .field("config", &self.config)
            .field("teacher_id", &self.teacher_id)
            .finish_non_exhaustive()
    }
}

impl<'a> Distiller<'a> {
    /// # Errors
    ///
    /// `MalformedConfig` if `config` has no distillation section.
    pub fn new(
        config: &OptimizationConfig,
        teacher: Model,
        eval: impl EvaluationFunction + 'a,
        step: impl DistillationFunction + 'a,
    ) -> Result<Self> {
        let settings = *config.distillation().ok_or_else(|| {
            Error::malformed(config.source().unwrap_or("<in-memory>"), "no distillation section")
        })?;
        Ok(Self {
            config: config.clone(),
            settings,
            teacher,
            teacher_id: None,
            eval: Box::new(eval),
            step: Box::new(step),
        })
    }

    /// Identifier recorded for the teacher in the effective config.
    #[must_use]
    pub fn with_teacher_id(mut self, id: impl Into<String>) -> Self {
        self.teacher_id = Some(id.into());
        self
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn teacher(&self) -> &Model {
        &self.teacher
    }

    /// Teacher and student must not declare different tasks.
    pub(crate) fn check_ready(&self, student: &Model) -> Result<()> {
        match (self.teacher.task(), student.task()) {
            (Some(teacher), Some(student)) if teacher != student => Err(Error::IncompatibleConfig {
                expected: format!("teacher for task {student}"),
                found: format!("teacher for task {teacher}"),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn run(&mut self, mut student: Model) -> Result<(Model, AppliedDistillation)> {
        self.check_ready(&student)?;
        let DistillationConfig { temperature, alpha, num_epochs } = self.settings;
        info!(temperature, alpha, num_epochs, "distillation started");

        for epoch in 0..num_epochs {
            let ctx = DistillContext { epoch, temperature, alpha };
            self.step.distill(&mut student, &self.teacher, &ctx)?;
            debug!(epoch, "distillation epoch done");
        }

        let metric = self.eval.evaluate(&student)?;
        info!(metric, "distillation finished");
        Ok((
            student,
            AppliedDistillation {
                temperature,
                alpha,
                num_epochs,
                teacher: self.teacher_id.clone(),
                metric,
            },
        ))
    }
}
