//! # comprimir
//!
//! Quantization, pruning and distillation sessions for transformer
//! checkpoints stored as `config.json` + `model.safetensors`.
//!
//! A session is configured from an [`OptimizationConfig`] (a local YAML/JSON
//! file or a hub repository), run with [`Optimizer::fit`] and persisted with
//! [`Optimizer::save_pretrained`]. Saved directories are reloaded for a task
//! head with [`QuantizedModel`].
//!
//! ```
//! use comprimir::config::{OptimizationConfig, PruningConfig, QuantApproach, QuantizationConfig};
//! use comprimir::{Model, ModelConfig, Optimizer, Pruner, Quantizer, Weight};
//!
//! # fn main() -> comprimir::Result<()> {
//! let model = Model::new(ModelConfig::new("bert"))
//!     .with_weight("dense.weight", Weight::from_vec(&[2, 4], vec![0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8])?);
//! let config = OptimizationConfig::new()
//!     .with_quantization(QuantizationConfig::new(QuantApproach::Dynamic))
//!     .with_pruning(PruningConfig::default().with_target_sparsity(0.25));
//!
//! let quantizer = Quantizer::new(&config, |_: &Model| 1.0f32)?;
//! let pruner = Pruner::new(&config, |_: &Model| 1.0f32, |_: &mut Model, _: usize| {})?;
//! let mut optimizer = Optimizer::new(model, Some(quantizer), Some(pruner));
//! let optimized = optimizer.fit()?;
//! assert_eq!(optimized.config().sparsity(), Some(0.25));
//! # Ok(())
//! # }
//! ```

pub mod callbacks;
pub mod cli;
pub mod config;
pub mod distill;
pub mod effective;
pub mod error;
pub mod fidelity;
pub mod hub;
pub mod loader;
pub mod model;
pub mod optimizer;
pub mod prune;
pub mod quant;

pub use callbacks::{DistillationFunction, EvaluationFunction, Fallible, TrainingFunction};
pub use config::{ConfigLoader, OptimizationConfig};
pub use distill::Distiller;
pub use effective::EffectiveConfig;
pub use error::{Error, Result};
pub use fidelity::WeightFidelity;
pub use hub::HubFetcher;
pub use loader::{
    QuantizedModel, QuantizedModelForCausalLm, QuantizedModelForMaskedLm,
    QuantizedModelForMultipleChoice, QuantizedModelForQuestionAnswering,
    QuantizedModelForSeq2SeqLm, QuantizedModelForSequenceClassification,
    QuantizedModelForTokenClassification, TaskHead,
};
pub use model::{Model, ModelConfig, Task, Weight};
pub use optimizer::{OptimizedModel, Optimizer, SessionState};
pub use prune::Pruner;
pub use quant::{CalibrationSet, Quantizer};
