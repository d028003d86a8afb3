//! `config.json` written next to model weights.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Task;
use crate::error::{Error, Result};
use std::path::Path;

/// Architecture description stored as `config.json`.
///
/// Only the fields this crate interprets are typed; everything else found in
/// the file is kept verbatim in `extra` and written back on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architectures: Vec<String>,

    /// Explicit task head; takes precedence over `architectures`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelConfig {
    pub fn new(model_type: impl Into<String>) -> Self {
        Self { model_type: Some(model_type.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architectures.push(architecture.into());
        self
    }

    #[must_use]
    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    /// Task head, explicit or inferred from the first recognised architecture.
    pub fn task(&self) -> Option<Task> {
        self.task.or_else(|| self.architectures.iter().find_map(|a| Task::from_architecture(a)))
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))
    }

    pub(crate) fn to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization { message: format!("config.json: {e}") })?;
        std::fs::write(path, json).map_err(|e| Error::io(format!("writing {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"model_type":"bert","architectures":["BertForQuestionAnswering"],"hidden_size":768}"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.task(), Some(Task::QuestionAnswering));
        assert_eq!(config.extra.get("hidden_size"), Some(&Value::from(768)));

        let back: ModelConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_explicit_task_wins() {
        let config = ModelConfig::new("gpt2")
            .with_architecture("GPT2LMHeadModel")
            .with_task(Task::SequenceClassification);
        assert_eq!(config.task(), Some(Task::SequenceClassification));
    }

    #[test]
    fn test_no_task_without_hints() {
        assert_eq!(ModelConfig::new("bert").task(), None);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ModelConfig::new("bert").with_task(Task::MaskedLm);
        config.to_file(&path).unwrap();
        assert_eq!(ModelConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ModelConfig::from_file(&path), Err(Error::MalformedConfig { .. })));
    }
}
