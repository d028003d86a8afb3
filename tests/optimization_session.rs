//! Integration tests for optimization sessions driven by on-disk configs

use comprimir::config::{QuantApproach, QuantizationConfig};
use comprimir::{
    ConfigLoader, Error, Model, ModelConfig, OptimizationConfig, Optimizer, Pruner, Quantizer,
    SessionState, Weight,
};
use std::cell::Cell;
use std::path::Path;

const DYNAMIC: &str = "quantization:\n  approach: post_training_dynamic_quant\n";

const COMBINED: &str = r#"
quantization:
  approach: post_training_dynamic_quant
pruning:
  target_sparsity: 0.1
  schedule:
    type: one_shot
"#;

fn base_model() -> Model {
    let ramp = |n: usize| (0..n).map(|i| (i as f32 - n as f32 / 2.0) / n as f32).collect();
    Model::new(ModelConfig::new("bert").with_architecture("BertForSequenceClassification"))
        .with_weight("bert.encoder.layer.0.attention.weight", Weight::from_vec(&[10, 10], ramp(100)).unwrap())
        .with_weight("bert.encoder.layer.0.attention.bias", Weight::from_vec(&[10], ramp(10)).unwrap())
        .with_weight("classifier.weight", Weight::from_vec(&[2, 10], ramp(20)).unwrap())
}

/// A config directory as a hub repository would lay it out.
fn config_dir(root: &Path, name: &str, yaml: &str) -> String {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(ConfigLoader::DEFAULT_FILE_NAME), yaml).unwrap();
    dir.to_string_lossy().into_owned()
}

#[test]
fn test_quantizer_construction_never_evaluates() {
    let root = tempfile::tempdir().unwrap();
    let id = config_dir(root.path(), "bert-int8-dynamic", DYNAMIC);
    let config = OptimizationConfig::from_pretrained(&id).unwrap();

    let calls = Cell::new(0);
    let quantizer = Quantizer::new(&config, |_: &Model| {
        calls.set(calls.get() + 1);
        0.7f32
    })
    .unwrap();
    let _optimizer = Optimizer::new(base_model(), Some(quantizer), None);
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_fit_with_nothing_configured_fails() {
    let mut optimizer = Optimizer::new(base_model(), None, None);
    let err = optimizer.fit().unwrap_err();
    assert!(matches!(err, Error::NothingToOptimize));
    assert_eq!(err.code(), "E021");
    assert_eq!(optimizer.state(), SessionState::Configured);
}

#[test]
fn test_int8_dynamic_scenario_reports_dynamic() {
    let root = tempfile::tempdir().unwrap();
    let id = config_dir(root.path(), "distilbert-int8-dynamic", DYNAMIC);
    let config = OptimizationConfig::from_pretrained(&id).unwrap();

    let quantizer = Quantizer::new(&config, |_: &Model| 0.85f32).unwrap();
    let mut optimizer = Optimizer::new(base_model(), Some(quantizer), None);
    let optimized = optimizer.fit().unwrap();

    let applied = optimized.config().quantization.as_ref().unwrap();
    assert_eq!(applied.approach, QuantApproach::Dynamic);
    assert_eq!(applied.approach.short_name(), "dynamic");
    assert_eq!(applied.tuning.final_metric, 0.85);
    assert!(optimized.model().weight("classifier.weight").unwrap().is_quantized());
}

#[test]
fn test_combined_run_shares_source() {
    let root = tempfile::tempdir().unwrap();
    let id = config_dir(root.path(), "bert-sparse-int8", COMBINED);
    let config = ConfigLoader::new().load(&id).unwrap();

    let quantizer = Quantizer::new(&config, |_: &Model| 1.0f32).unwrap();
    let pruner = Pruner::new(&config, |_: &Model| 1.0f32, |_: &mut Model, _: usize| {}).unwrap();
    let mut optimizer = Optimizer::new(base_model(), Some(quantizer), Some(pruner));
    optimizer.fit().unwrap();

    let out = root.path().join("saved");
    optimizer.save_pretrained(&out).unwrap();
    let saved = comprimir::EffectiveConfig::from_file(&out.join(comprimir::effective::EFFECTIVE_CONFIG_FILE))
        .unwrap();
    assert_eq!(saved.sparsity(), Some(0.1));
    assert_eq!(saved.approach(), Some(QuantApproach::Dynamic));
    assert_eq!(saved.source.as_deref(), Some(id.as_str()));
}

#[test]
fn test_combined_run_with_different_sources_rejected() {
    let root = tempfile::tempdir().unwrap();
    let quant_id = config_dir(root.path(), "a", DYNAMIC);
    let prune_id = config_dir(root.path(), "b", COMBINED);

    let quantizer = Quantizer::new(&OptimizationConfig::from_pretrained(&quant_id).unwrap(), |_: &Model| 1.0f32)
        .unwrap();
    let pruner = Pruner::new(
        &OptimizationConfig::from_pretrained(&prune_id).unwrap(),
        |_: &Model| 1.0f32,
        |_: &mut Model, _: usize| {},
    )
    .unwrap();
    let mut optimizer = Optimizer::new(base_model(), Some(quantizer), Some(pruner));
    assert!(matches!(optimizer.fit(), Err(Error::ConfigSourceMismatch { .. })));
}

#[test]
fn test_save_before_fit_rejected() {
    let config = OptimizationConfig::new().with_quantization(QuantizationConfig::default());
    let quantizer = Quantizer::new(&config, |_: &Model| 1.0f32).unwrap();
    let mut optimizer = Optimizer::new(base_model(), Some(quantizer), None);

    let root = tempfile::tempdir().unwrap();
    let err = optimizer.save_pretrained(root.path().join("out")).unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
    assert!(!root.path().join("out").exists());
}

#[test]
fn test_unknown_config_identifier_not_found() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nothing-here");
    let err = OptimizationConfig::from_pretrained(missing.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}
