//! Tests for distillation sessions

use super::*;
use crate::callbacks::DistillContext;
use crate::config::{DistillationConfig, OptimizationConfig};
use crate::error::Error;
use crate::model::{Model, ModelConfig, Task, Weight};
use std::cell::{Cell, RefCell};

fn model(task: Task, value: f32) -> Model {
    Model::new(ModelConfig::new("bert").with_task(task))
        .with_weight("classifier.weight", Weight::from_vec(&[2, 2], vec![value; 4]).unwrap())
}

fn config(num_epochs: usize) -> OptimizationConfig {
    OptimizationConfig::new()
        .with_distillation(DistillationConfig { temperature: 2.0, alpha: 0.7, num_epochs })
}

fn no_step(_: &mut Model, _: &Model, _: &DistillContext) {}

#[test]
fn test_new_requires_distillation_section() {
    let teacher = model(Task::SequenceClassification, 1.0);
    let err = Distiller::new(&OptimizationConfig::new(), teacher, |_: &Model| 1.0f32, no_step).unwrap_err();
    assert!(matches!(err, Error::MalformedConfig { .. }));
}

#[test]
fn test_construction_invokes_no_callback() {
    let calls = Cell::new(0);
    let _distiller = Distiller::new(
        &config(2),
        model(Task::SequenceClassification, 1.0),
        |_: &Model| {
            calls.set(calls.get() + 1);
            1.0f32
        },
        |_: &mut Model, _: &Model, _: &DistillContext| calls.set(calls.get() + 1),
    )
    .unwrap();
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_step_runs_once_per_epoch_with_context() {
    let seen = RefCell::new(Vec::new());
    let step = |student: &mut Model, teacher: &Model, ctx: &DistillContext| {
        seen.borrow_mut().push(*ctx);
        // Move the student toward the teacher.
        let target = teacher.weight("classifier.weight").unwrap().to_f32_vec();
        student.insert("classifier.weight", Weight::from_vec(&[2, 2], target).unwrap());
    };
    let mut distiller = Distiller::new(
        &config(3),
        model(Task::SequenceClassification, 2.0),
        |m: &Model| m.weight("classifier.weight").unwrap().to_f32_vec()[0],
        step,
    )
    .unwrap()
    .with_teacher_id("org/teacher");

    let (student, applied) = distiller.run(model(Task::SequenceClassification, 0.0)).unwrap();
    drop(distiller);

    let seen = seen.borrow();
    assert_eq!(seen.iter().map(|c| c.epoch).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(seen.iter().all(|c| c.temperature == 2.0 && c.alpha == 0.7));
    assert_eq!(student.weight("classifier.weight").unwrap().to_f32_vec(), vec![2.0; 4]);
    assert_eq!(applied.metric, 2.0);
    assert_eq!(applied.num_epochs, 3);
    assert_eq!(applied.teacher.as_deref(), Some("org/teacher"));
}

#[test]
fn test_task_mismatch_rejected_before_any_step() {
    let calls = Cell::new(0);
    let mut distiller = Distiller::new(
        &config(1),
        model(Task::QuestionAnswering, 1.0),
        |_: &Model| 1.0f32,
        |_: &mut Model, _: &Model, _: &DistillContext| calls.set(calls.get() + 1),
    )
    .unwrap();
    let student = model(Task::SequenceClassification, 0.0);
    assert!(matches!(distiller.check_ready(&student), Err(Error::IncompatibleConfig { .. })));
    assert!(distiller.run(student).is_err());
    drop(distiller);
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_undeclared_task_accepted() {
    let teacher = Model::new(ModelConfig::new("bert"));
    let distiller = Distiller::new(&config(1), teacher, |_: &Model| 1.0f32, no_step).unwrap();
    assert!(distiller.check_ready(&model(Task::MaskedLm, 0.0)).is_ok());
}
