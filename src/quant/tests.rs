//! Tests for quantization sessions

use super::*;
use crate::config::{
    AccuracyCriterion, ExitPolicy, OptimizationConfig, QuantApproach, QuantizationConfig,
    TuningConfig, TuningStrategy,
};
use crate::error::Error;
use crate::model::{Model, ModelConfig, Weight};
use std::cell::Cell;

fn model() -> Model {
    let w = |rows: usize, cols: usize, scale: f32| {
        let data = (0..rows * cols).map(|i| ((i as f32 * 0.37).sin()) * scale).collect();
        Weight::from_vec(&[rows, cols], data).unwrap()
    };
    Model::new(ModelConfig::new("bert").with_architecture("BertForSequenceClassification"))
        .with_weight("encoder.layer.0.attention.weight", w(4, 8, 1.0))
        .with_weight("encoder.layer.0.attention.bias", Weight::from_vec(&[4], vec![0.1; 4]).unwrap())
        .with_weight("encoder.layer.0.output.weight", w(8, 4, 3.0))
        .with_weight("classifier.weight", w(2, 8, 0.5))
}

fn config(quant: QuantizationConfig) -> OptimizationConfig {
    OptimizationConfig::new().with_quantization(quant)
}

fn int8_count(model: &Model) -> usize {
    model.weights().filter(|(_, w)| w.is_quantized()).count()
}

#[test]
fn test_new_requires_quantization_section() {
    let err = Quantizer::new(&OptimizationConfig::new(), |_: &Model| 1.0f32).unwrap_err();
    assert!(matches!(err, Error::MalformedConfig { .. }));
}

#[test]
fn test_construction_never_evaluates() {
    let calls = Cell::new(0);
    let _quantizer = Quantizer::new(&config(QuantizationConfig::default()), |_: &Model| {
        calls.set(calls.get() + 1);
        1.0f32
    })
    .unwrap();
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_dynamic_quantizes_every_eligible_weight() {
    let mut quantizer =
        Quantizer::new(&config(QuantizationConfig::new(QuantApproach::Dynamic)), |_: &Model| 0.9f32)
            .unwrap();
    let (out, applied) = quantizer.run(model()).unwrap();

    assert_eq!(applied.approach, QuantApproach::Dynamic);
    assert_eq!(
        applied.quantized_ops,
        vec![
            "encoder.layer.0.attention.weight",
            "encoder.layer.0.output.weight",
            "classifier.weight"
        ]
    );
    assert!(applied.fallback_ops.is_empty());
    assert_eq!(applied.tuning.trials, 1);
    assert_eq!(applied.tuning.baseline, 0.9);
    assert_eq!(int8_count(&out), 3);
    // Bias vectors stay fp32.
    assert!(!out.weight("encoder.layer.0.attention.bias").unwrap().is_quantized());
}

#[test]
fn test_excluded_ops_stay_fp32() {
    let quant = QuantizationConfig::default().with_excluded_ops(["classifier"]);
    let mut quantizer = Quantizer::new(&config(quant), |_: &Model| 1.0f32).unwrap();
    let (out, applied) = quantizer.run(model()).unwrap();
    assert!(!out.weight("classifier.weight").unwrap().is_quantized());
    assert!(!applied.quantized_ops.iter().any(|op| op.starts_with("classifier")));
    // Excluded ops are not candidates, so they are not fallbacks either.
    assert!(applied.fallback_ops.is_empty());
}

#[test]
fn test_basic_strategy_falls_back_last_op_first() {
    // Metric is only acceptable once the classifier is back in fp32.
    let eval = |m: &Model| {
        if m.weight("classifier.weight").unwrap().is_quantized() {
            0.5f32
        } else {
            0.9
        }
    };
    let mut quantizer = Quantizer::new(&config(QuantizationConfig::default()), eval).unwrap();
    let (out, applied) = quantizer.run(model()).unwrap();

    assert_eq!(applied.tuning.trials, 2);
    assert_eq!(applied.fallback_ops, vec!["classifier.weight"]);
    assert_eq!(int8_count(&out), 2);
}

#[test]
fn test_mse_strategy_falls_back_noisiest_op_first() {
    let tuning = TuningConfig { strategy: TuningStrategy::Mse, ..TuningConfig::default() };
    let cfg = config(QuantizationConfig::default()).with_tuning(tuning);
    // The output weight has the widest range and so the largest error.
    let eval = |m: &Model| {
        if m.weight("encoder.layer.0.output.weight").unwrap().is_quantized() {
            0.0f32
        } else {
            1.0
        }
    };
    let mut quantizer = Quantizer::new(&cfg, eval).unwrap();
    let (_, applied) = quantizer.run(model()).unwrap();
    assert_eq!(applied.fallback_ops, vec!["encoder.layer.0.output.weight"]);
    assert_eq!(applied.tuning.trials, 2);
}

#[test]
fn test_non_convergence_fails() {
    let tuning = TuningConfig {
        accuracy_criterion: AccuracyCriterion::relative(0.0),
        exit_policy: ExitPolicy { max_trials: 2, timeout_secs: 0 },
        ..TuningConfig::default()
    };
    let cfg = config(QuantizationConfig::default()).with_tuning(tuning);
    let calls = Cell::new(0);
    let eval = |_: &Model| {
        calls.set(calls.get() + 1);
        // Baseline is 1.0; every candidate is worse.
        if calls.get() == 1 {
            1.0f32
        } else {
            0.1
        }
    };
    let mut quantizer = Quantizer::new(&cfg, eval).unwrap();
    let err = quantizer.run(model()).unwrap_err();
    assert!(matches!(err, Error::OptimizationFailed { trials: 2, .. }));
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_static_requires_calibration() {
    let cfg = config(QuantizationConfig::new(QuantApproach::Static));
    let calls = Cell::new(0);
    let mut quantizer = Quantizer::new(&cfg, |_: &Model| {
        calls.set(calls.get() + 1);
        1.0f32
    })
    .unwrap();
    assert!(matches!(quantizer.run(model()), Err(Error::CalibrationRequired { .. })));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_static_records_ranges_and_falls_back_uncalibrated_ops() {
    let cfg = config(QuantizationConfig::new(QuantApproach::Static));
    let samples = CalibrationSet::new()
        .with_batch("encoder.layer.0.attention.weight", vec![-1.0, 0.5, 2.0])
        .with_batch("encoder.layer.0.output.weight", vec![0.0, 4.0]);
    let mut quantizer =
        Quantizer::new(&cfg, |_: &Model| 1.0f32).unwrap().with_calibration(samples);
    let (out, applied) = quantizer.run(model()).unwrap();

    assert_eq!(applied.activation_ranges.len(), 2);
    assert_eq!(applied.activation_ranges["encoder.layer.0.attention.weight"].max, 2.0);
    assert_eq!(applied.fallback_ops, vec!["classifier.weight"]);
    assert!(!out.weight("classifier.weight").unwrap().is_quantized());
}

#[test]
fn test_aware_training_requires_train_func() {
    let cfg = config(QuantizationConfig::new(QuantApproach::AwareTraining));
    let mut quantizer = Quantizer::new(&cfg, |_: &Model| 1.0f32).unwrap();
    assert!(matches!(quantizer.run(model()), Err(Error::MissingTrainingFunction { .. })));
}

#[test]
fn test_aware_training_trains_on_fake_quantized_weights() {
    let cfg = config(QuantizationConfig::new(QuantApproach::AwareTraining).with_train_epochs(3));
    let mut epochs = Vec::new();
    let train = |m: &mut Model, epoch: usize| {
        // Weights seen by training are still float.
        assert!(!m.weight("classifier.weight").unwrap().is_quantized());
        epochs.push(epoch);
    };
    let mut quantizer = Quantizer::new(&cfg, |_: &Model| 1.0f32).unwrap().with_train_func(train);
    let (out, applied) = quantizer.run(model()).unwrap();
    drop(quantizer);

    assert_eq!(epochs, vec![0, 1, 2]);
    assert_eq!(applied.approach, QuantApproach::AwareTraining);
    assert_eq!(int8_count(&out), 3);
}
