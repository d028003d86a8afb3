//! Integration tests for reloading saved sessions per task head

use comprimir::config::{QuantApproach, QuantizationConfig};
use comprimir::{
    Error, Model, ModelConfig, OptimizationConfig, Optimizer, QuantizedModelForCausalLm,
    QuantizedModelForQuestionAnswering, QuantizedModelForSequenceClassification, Quantizer, Weight,
};

fn model(architecture: &str, head: &str) -> Model {
    let values: Vec<f32> = (0..24).map(|i| (i as f32 - 12.0) * 0.05).collect();
    Model::new(ModelConfig::new("distilbert").with_architecture(architecture))
        .with_weight("distilbert.transformer.ffn.weight", Weight::from_vec(&[4, 6], values.clone()).unwrap())
        .with_weight(head, Weight::from_vec(&[2, 12], values).unwrap())
}

fn fit_and_save(model: Model, dir: &std::path::Path) -> comprimir::EffectiveConfig {
    let config = OptimizationConfig::new()
        .with_quantization(QuantizationConfig::new(QuantApproach::Dynamic))
        .with_source("org/distilbert-int8-dynamic");
    let quantizer = Quantizer::new(&config, |_: &Model| 0.9f32).unwrap();
    let mut optimizer = Optimizer::new(model, Some(quantizer), None);
    let effective = optimizer.fit().unwrap().config().clone();
    optimizer.save_pretrained(dir).unwrap();
    effective
}

#[test]
fn test_roundtrip_preserves_effective_config() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("saved");
    let effective = fit_and_save(model("DistilBertForSequenceClassification", "classifier.weight"), &dir);

    let loaded = QuantizedModelForSequenceClassification::from_pretrained(dir.to_str().unwrap()).unwrap();
    assert_eq!(loaded.config(), &effective);
    assert!(loaded.model().weight("classifier.weight").unwrap().is_quantized());
}

#[test]
fn test_roundtrip_preserves_int8_weights() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("saved");
    let base = model("DistilBertForQuestionAnswering", "qa_outputs.weight");
    fit_and_save(base, &dir);

    let loaded = QuantizedModelForQuestionAnswering::from_pretrained(dir.to_str().unwrap()).unwrap();
    let original: Vec<f32> = (0..24).map(|i| (i as f32 - 12.0) * 0.05).collect();
    let restored = loaded.model().weight("qa_outputs.weight").unwrap().to_f32_vec();
    for (a, b) in original.iter().zip(&restored) {
        assert!((a - b).abs() <= 0.6 / 127.0, "{a} vs {b}");
    }
}

#[test]
fn test_mismatched_head_rejected() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("saved");
    fit_and_save(model("DistilBertForQuestionAnswering", "qa_outputs.weight"), &dir);

    let err = QuantizedModelForCausalLm::from_pretrained(dir.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, Error::IncompatibleConfig { .. }), "{err}");
}

#[test]
fn test_missing_directory_not_found() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("never-saved");
    let err = QuantizedModelForSequenceClassification::from_pretrained(dir.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}
