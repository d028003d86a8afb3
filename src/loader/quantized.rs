//! Saved-directory loader.

use std::marker::PhantomData;
use tracing::info;

use super::TaskHead;
use crate::effective::{EffectiveConfig, EFFECTIVE_CONFIG_FILE};
use crate::error::Result;
use crate::hub::HubFetcher;
use crate::model::Model;

/// A model written by `save_pretrained`, checked against task head `H`.
///
/// ```no_run
/// use comprimir::QuantizedModelForSequenceClassification;
///
/// let loaded = QuantizedModelForSequenceClassification::from_pretrained("out")?;
/// println!("{:?}", loaded.config().approach());
/// # Ok::<(), comprimir::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedModel<H: TaskHead> {
    model: Model,
    config: EffectiveConfig,
    head: PhantomData<H>,
}

impl<H: TaskHead> QuantizedModel<H> {
    /// Load from a saved directory or hub repository.
    ///
    /// # Errors
    ///
    /// - `NotFound` if any saved file is missing.
    /// - `IncompatibleConfig` if the model is for another task or lacks
    ///   `H`'s head weights.
    pub fn from_pretrained(identifier: &str) -> Result<Self> {
        Self::from_pretrained_with(identifier, &HubFetcher::new())
    }

    pub fn from_pretrained_with(identifier: &str, fetcher: &HubFetcher) -> Result<Self> {
        let config = EffectiveConfig::from_file(&fetcher.resolve_file(identifier, EFFECTIVE_CONFIG_FILE)?)?;
        let model = Model::from_pretrained_with(identifier, fetcher)?;
        H::validate(&model)?;
        info!(identifier, task = %H::TASK, approach = ?config.approach(), "loaded optimized model");
        Ok(Self { model, config, head: PhantomData })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Settings recorded when the model was fitted.
    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Model, EffectiveConfig) {
        (self.model, self.config)
    }
}
