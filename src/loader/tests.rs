//! Tests for saved-model loaders

use super::*;
use crate::effective::{EffectiveConfig, EFFECTIVE_CONFIG_FILE};
use crate::error::Error;
use crate::hub::HubFetcher;
use crate::model::{Model, ModelConfig, Task, Weight};
use crate::optimizer::OptimizedModel;
use std::path::Path;

fn offline() -> HubFetcher {
    HubFetcher::new().with_offline(true)
}

fn save(model: Model, dir: &Path) {
    let config = EffectiveConfig { source: Some("org/cfg".into()), ..Default::default() };
    OptimizedModel::new(model, config).save_pretrained(dir).unwrap();
}

fn qa_model() -> Model {
    Model::new(ModelConfig::new("distilbert").with_architecture("DistilBertForQuestionAnswering"))
        .with_weight("distilbert.dense.weight", Weight::from_vec(&[2, 2], vec![0.1; 4]).unwrap())
        .with_weight("qa_outputs.weight", Weight::from_vec(&[2, 2], vec![0.2; 4]).unwrap())
}

#[test]
fn test_matching_head_loads() {
    let dir = tempfile::tempdir().unwrap();
    save(qa_model(), dir.path());
    let id = dir.path().to_str().unwrap();
    let loaded = QuantizedModelForQuestionAnswering::from_pretrained_with(id, &offline()).unwrap();
    assert_eq!(loaded.config().source.as_deref(), Some("org/cfg"));
    assert_eq!(loaded.model(), &qa_model());
}

#[test]
fn test_mismatched_task_rejected() {
    let dir = tempfile::tempdir().unwrap();
    save(qa_model(), dir.path());
    let id = dir.path().to_str().unwrap();
    let err = QuantizedModelForCausalLm::from_pretrained_with(id, &offline()).unwrap_err();
    assert!(matches!(err, Error::IncompatibleConfig { .. }), "{err}");
}

#[test]
fn test_missing_head_weights_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let headless = Model::new(ModelConfig::new("bert").with_task(Task::SequenceClassification))
        .with_weight("bert.dense.weight", Weight::from_vec(&[1], vec![1.0]).unwrap());
    save(headless, dir.path());
    let id = dir.path().to_str().unwrap();
    let err = QuantizedModelForSequenceClassification::from_pretrained_with(id, &offline()).unwrap_err();
    assert!(matches!(err, Error::IncompatibleConfig { .. }));
}

#[test]
fn test_undeclared_task_judged_by_weights() {
    let model = Model::new(ModelConfig::default())
        .with_weight("lm_head.weight", Weight::from_vec(&[2, 2], vec![1.0; 4]).unwrap());
    assert!(CausalLm::validate(&model).is_ok());
    assert!(QuestionAnswering::validate(&model).is_err());
}

#[test]
fn test_missing_effective_config_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    save(qa_model(), dir.path());
    std::fs::remove_file(dir.path().join(EFFECTIVE_CONFIG_FILE)).unwrap();
    let id = dir.path().to_str().unwrap();
    let err = QuantizedModelForQuestionAnswering::from_pretrained_with(id, &offline()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_unknown_identifier_is_not_found() {
    let err = QuantizedModelForMaskedLm::from_pretrained_with("no-such-org/no-such-model", &offline())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_every_task_has_a_head() {
    assert_eq!(SequenceClassification::TASK, Task::SequenceClassification);
    assert_eq!(Seq2SeqLm::TASK, Task::Seq2SeqLm);
    assert_eq!(TokenClassification::TASK, Task::TokenClassification);
    assert_eq!(MultipleChoice::TASK, Task::MultipleChoice);
    assert_eq!(MaskedLm::TASK, Task::MaskedLm);
}
