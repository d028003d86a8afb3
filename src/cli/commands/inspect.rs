//! Inspect command implementation

use serde::Serialize;

use super::{fail, overall_sparsity};
use crate::cli::logging::log;
use crate::cli::{InspectArgs, LogLevel, OutputFormat};
use crate::effective::{EffectiveConfig, EFFECTIVE_CONFIG_FILE};
use crate::error::Error;
use crate::hub::HubFetcher;
use crate::model::{Model, Task};

/// Summary of a saved directory.
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub task: Option<Task>,
    pub weights: usize,
    pub int8_weights: usize,
    pub parameters: usize,
    pub memory_bytes: usize,
    pub sparsity: f32,
    pub effective: Option<EffectiveConfig>,
}

impl ModelSummary {
    pub fn load(identifier: &str) -> crate::error::Result<Self> {
        let fetcher = HubFetcher::new();
        let model = Model::from_pretrained_with(identifier, &fetcher)?;
        let effective = match fetcher.resolve_file(identifier, EFFECTIVE_CONFIG_FILE) {
            Ok(path) => Some(EffectiveConfig::from_file(&path)?),
            Err(Error::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            task: model.task(),
            weights: model.len(),
            int8_weights: model.weights().filter(|(_, w)| w.is_quantized()).count(),
            parameters: model.num_parameters(),
            memory_bytes: model.memory_bytes(),
            sparsity: overall_sparsity(&model),
            effective,
        })
    }

    fn to_text(&self) -> String {
        let mut lines = vec![
            format!("  Task: {}", self.task.map_or("unknown", |t| t.as_str())),
            format!("  Weights: {} ({} int8)", self.weights, self.int8_weights),
            format!("  Parameters: {}", self.parameters),
            format!("  Memory: {} bytes", self.memory_bytes),
            format!("  Sparsity: {:.2}%", self.sparsity * 100.0),
        ];
        match &self.effective {
            Some(effective) => {
                if let Some(source) = &effective.source {
                    lines.push(format!("  Config source: {source}"));
                }
                if let Some(approach) = effective.approach() {
                    lines.push(format!("  Quantization: {}", approach.short_name()));
                }
                if let Some(sparsity) = effective.sparsity() {
                    lines.push(format!("  Target sparsity: {sparsity:.2}"));
                }
                if effective.distillation.is_some() {
                    lines.push("  Distilled: yes".to_string());
                }
            }
            None => lines.push(format!("  No {EFFECTIVE_CONFIG_FILE}")),
        }
        lines.join("\n")
    }
}

pub fn run_inspect(args: InspectArgs, level: LogLevel) -> Result<(), String> {
    let summary = ModelSummary::load(&args.model).map_err(fail)?;
    let output = match args.format {
        OutputFormat::Text => format!("Inspecting {}\n{}", args.model, summary.to_text()),
        OutputFormat::Json => serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?,
        OutputFormat::Yaml => serde_yaml::to_string(&summary).map_err(|e| e.to_string())?,
    };
    log(level, LogLevel::Normal, &output);
    Ok(())
}
