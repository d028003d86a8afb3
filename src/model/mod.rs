//! In-memory models: a `config.json` description plus ordered named weights.

mod config;
pub(crate) mod io;
mod task;
mod weight;

pub use config::ModelConfig;
pub use task::Task;
pub use weight::Weight;

use crate::error::Result;
use crate::hub::HubFetcher;
use std::path::Path;
use tracing::info;

/// File name of the architecture description inside a model directory.
pub const CONFIG_FILE: &str = "config.json";
/// File name of the weights inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// A model checkpoint.
///
/// Weights keep insertion order; quantization fallback and reports follow it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    config: ModelConfig,
    weights: Vec<(String, Weight)>,
}

impl Model {
    pub fn new(config: ModelConfig) -> Self {
        Self { config, weights: Vec::new() }
    }

    /// Add or replace a weight.
    #[must_use]
    pub fn with_weight(mut self, name: impl Into<String>, weight: Weight) -> Self {
        self.insert(name, weight);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ModelConfig {
        &mut self.config
    }

    pub fn task(&self) -> Option<Task> {
        self.config.task()
    }

    /// Add or replace a weight, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, weight: Weight) -> Option<Weight> {
        let name = name.into();
        match self.weights.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, weight)),
            None => {
                self.weights.push((name, weight));
                None
            }
        }
    }

    pub fn weight(&self, name: &str) -> Option<&Weight> {
        self.weights.iter().find(|(n, _)| n == name).map(|(_, w)| w)
    }

    pub fn weight_mut(&mut self, name: &str) -> Option<&mut Weight> {
        self.weights.iter_mut().find(|(n, _)| n == name).map(|(_, w)| w)
    }

    pub fn weights(&self) -> impl Iterator<Item = (&str, &Weight)> {
        self.weights.iter().map(|(n, w)| (n.as_str(), w))
    }

    pub fn names(&self) -> Vec<&str> {
        self.weights.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.iter().map(|(_, w)| w.numel()).sum()
    }

    pub fn memory_bytes(&self) -> usize {
        self.weights.iter().map(|(_, w)| w.memory_bytes()).sum()
    }

    /// True if some weight belongs to the output head of `task`.
    pub fn has_head(&self, task: Task) -> bool {
        let prefixes = task.head_prefixes();
        self.weights.iter().any(|(n, _)| prefixes.iter().any(|p| n.starts_with(p)))
    }

    /// Load `config.json` and `model.safetensors` from a directory or hub repository.
    pub fn from_pretrained(identifier: &str) -> Result<Self> {
        Self::from_pretrained_with(identifier, &HubFetcher::new())
    }

    pub fn from_pretrained_with(identifier: &str, fetcher: &HubFetcher) -> Result<Self> {
        let config = ModelConfig::from_file(&fetcher.resolve_file(identifier, CONFIG_FILE)?)?;
        let weights = io::read_weights(&fetcher.resolve_file(identifier, WEIGHTS_FILE)?)?;
        info!(identifier, weights = weights.len(), "loaded model");
        Ok(Self { config, weights })
    }

    /// Write `config.json` and `model.safetensors` into an existing directory.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        self.config.to_file(&dir.join(CONFIG_FILE))?;
        io::write_weights(&self.weights, &dir.join(WEIGHTS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn tiny() -> Model {
        Model::new(ModelConfig::new("bert").with_architecture("BertForSequenceClassification"))
            .with_weight("bert.dense.weight", Weight::from_vec(&[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap())
            .with_weight("classifier.weight", Weight::from_vec(&[2, 2], vec![0.5; 4]).unwrap())
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut model = tiny();
        let old = model.insert("bert.dense.weight", Weight::from_vec(&[1], vec![3.0]).unwrap());
        assert!(old.is_some());
        assert_eq!(model.names(), vec!["bert.dense.weight", "classifier.weight"]);
        assert_eq!(model.num_parameters(), 5);
    }

    #[test]
    fn test_has_head() {
        let model = tiny();
        assert!(model.has_head(Task::SequenceClassification));
        assert!(!model.has_head(Task::QuestionAnswering));
    }

    #[test]
    fn test_write_then_from_pretrained() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny();
        model.write_to(dir.path()).unwrap();

        let fetcher = HubFetcher::new().with_offline(true);
        let loaded = Model::from_pretrained_with(dir.path().to_str().unwrap(), &fetcher).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.task(), Some(Task::SequenceClassification));
    }

    #[test]
    fn test_from_pretrained_missing_directory() {
        let fetcher = HubFetcher::new().with_offline(true);
        let err = Model::from_pretrained_with("/no/such/model", &fetcher).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
