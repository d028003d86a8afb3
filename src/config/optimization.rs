//! The top-level optimization config.

use serde::{Deserialize, Serialize};

use super::{DistillationConfig, PruningConfig, QuantizationConfig, TuningConfig};
use crate::error::{Error, Result};

/// Serialized description of a compression session.
///
/// Loaded once by [`ConfigLoader`](super::ConfigLoader) and read-only
/// afterwards. Configs built in code have no `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationConfig {
    #[serde(skip)]
    source: Option<String>,

    #[serde(default = "default_version")]
    version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantization: Option<QuantizationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pruning: Option<PruningConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    distillation: Option<DistillationConfig>,

    #[serde(default)]
    tuning: TuningConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            source: None,
            version: default_version(),
            quantization: None,
            pruning: None,
            distillation: None,
            tuning: TuningConfig::default(),
        }
    }
}

impl OptimizationConfig {
    /// Empty config; add at least one section before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a file, directory or hub repository.
    pub fn from_pretrained(identifier: &str) -> Result<Self> {
        super::ConfigLoader::new().load(identifier)
    }

    #[must_use]
    pub fn with_quantization(mut self, quantization: QuantizationConfig) -> Self {
        self.quantization = Some(quantization);
        self
    }

    #[must_use]
    pub fn with_pruning(mut self, pruning: PruningConfig) -> Self {
        self.pruning = Some(pruning);
        self
    }

    #[must_use]
    pub fn with_distillation(mut self, distillation: DistillationConfig) -> Self {
        self.distillation = Some(distillation);
        self
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: TuningConfig) -> Self {
        self.tuning = tuning;
        self
    }

    /// Tag the config with the identifier it came from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn quantization(&self) -> Option<&QuantizationConfig> {
        self.quantization.as_ref()
    }

    pub fn pruning(&self) -> Option<&PruningConfig> {
        self.pruning.as_ref()
    }

    pub fn distillation(&self) -> Option<&DistillationConfig> {
        self.distillation.as_ref()
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.tuning
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.quantization.is_none() && self.pruning.is_none() && self.distillation.is_none() {
            return Err("config has no quantization, pruning or distillation section".to_string());
        }
        if let Some(q) = &self.quantization {
            q.validate().map_err(|e| format!("quantization: {e}"))?;
        }
        if let Some(p) = &self.pruning {
            p.validate().map_err(|e| format!("pruning: {e}"))?;
        }
        if let Some(d) = &self.distillation {
            d.validate().map_err(|e| format!("distillation: {e}"))?;
        }
        self.tuning.validate().map_err(|e| format!("tuning: {e}"))
    }

    /// Parse YAML (JSON is accepted too) and validate.
    pub fn from_yaml(yaml: &str, identifier: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::malformed(identifier, e.to_string()))?;
        config.validated(identifier)
    }

    pub fn from_json(json: &str, identifier: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::malformed(identifier, e.to_string()))?;
        config.validated(identifier)
    }

    fn validated(mut self, identifier: &str) -> Result<Self> {
        self.validate().map_err(|e| Error::malformed(identifier, e))?;
        self.source = Some(identifier.to_string());
        Ok(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Serialization { message: format!("optimization config: {e}") })
    }
}
