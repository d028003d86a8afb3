//! The optimizer session and its result.

use std::path::Path;
use tracing::{info, warn};

use super::save::save_dir;
use super::SessionState;
use crate::distill::Distiller;
use crate::effective::EffectiveConfig;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::prune::Pruner;
use crate::quant::Quantizer;

/// A fitted model plus the settings that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedModel {
    model: Model,
    config: EffectiveConfig,
}

impl OptimizedModel {
    pub fn new(model: Model, config: EffectiveConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Model, EffectiveConfig) {
        (self.model, self.config)
    }

    /// Write `config.json`, `model.safetensors` and `best_configure.yml` into `dir`.
    ///
    /// # Errors
    ///
    /// `Io` if staging or publishing the directory fails.
    pub fn save_pretrained(&self, dir: impl AsRef<Path>) -> Result<()> {
        save_dir(&self.model, &self.config, dir.as_ref())
    }
}

/// Runs distillation, pruning and quantization over a base model.
///
/// ```no_run
/// use comprimir::{Model, OptimizationConfig, Optimizer, Quantizer};
///
/// # fn main() -> comprimir::Result<()> {
/// let config = OptimizationConfig::from_pretrained("org/model-int8-dynamic")?;
/// let quantizer = Quantizer::new(&config, |_: &Model| 0.9f32)?;
/// let mut optimizer = Optimizer::new(Model::from_pretrained("org/model")?, Some(quantizer), None);
/// optimizer.fit()?;
/// optimizer.save_pretrained("out")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Optimizer<'a> {
    model: Option<Model>,
    quantizer: Option<Quantizer<'a>>,
    pruner: Option<Pruner<'a>>,
    distiller: Option<Distiller<'a>>,
    state: SessionState,
    result: Option<OptimizedModel>,
}

impl<'a> Optimizer<'a> {
    /// Takes ownership of `model`; no callback runs before [`fit`](Self::fit).
    pub fn new(model: Model, quantizer: Option<Quantizer<'a>>, pruner: Option<Pruner<'a>>) -> Self {
        Self {
            model: Some(model),
            quantizer,
            pruner,
            distiller: None,
            state: SessionState::Configured,
            result: None,
        }
    }

    #[must_use]
    pub fn with_distiller(mut self, distiller: Distiller<'a>) -> Self {
        self.distiller = Some(distiller);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The fitted model, once `fit()` has succeeded.
    pub fn optimized(&self) -> Option<&OptimizedModel> {
        self.result.as_ref()
    }

    pub fn into_optimized(self) -> Option<OptimizedModel> {
        self.result
    }

    fn sources(&self) -> Vec<Option<&str>> {
        let mut sources = Vec::new();
        if let Some(d) = &self.distiller {
            sources.push(d.config().source());
        }
        if let Some(p) = &self.pruner {
            sources.push(p.config().source());
        }
        if let Some(q) = &self.quantizer {
            sources.push(q.config().source());
        }
        sources
    }

    /// Checks that need no callback and leave the session `Configured`.
    fn preflight(&self) -> Result<Option<String>> {
        let sources = self.sources();
        let Some(first) = sources.first().copied() else {
            return Err(Error::NothingToOptimize);
        };
        if let Some(other) = sources.iter().copied().find(|s| *s != first) {
            let label = |s: Option<&str>| s.unwrap_or("<in-memory>").to_string();
            return Err(Error::ConfigSourceMismatch { first: label(first), second: label(other) });
        }
        Ok(first.map(str::to_string))
    }

    fn check_components(&self, model: &Model) -> Result<()> {
        if let Some(d) = &self.distiller {
            d.check_ready(model)?;
        }
        if let Some(p) = &self.pruner {
            p.check_ready(model)?;
        }
        if let Some(q) = &self.quantizer {
            q.check_ready()?;
        }
        Ok(())
    }

    fn run_components(&mut self, mut model: Model, source: Option<String>) -> Result<OptimizedModel> {
        let mut config = EffectiveConfig { source, ..Default::default() };
        if let Some(distiller) = &mut self.distiller {
            let (m, applied) = distiller.run(model)?;
            model = m;
            config.distillation = Some(applied);
        }
        if let Some(pruner) = &mut self.pruner {
            let (m, applied) = pruner.run(model)?;
            model = m;
            config.pruning = Some(applied);
        }
        if let Some(quantizer) = &mut self.quantizer {
            let (m, applied) = quantizer.run(model)?;
            model = m;
            config.quantization = Some(applied);
        }
        Ok(OptimizedModel::new(model, config))
    }

    /// Run distillation, then pruning, then quantization.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the session is `Configured`.
    /// - `NothingToOptimize` / `ConfigSourceMismatch`; the session stays `Configured`.
    /// - Any component or callback error; the session becomes `Failed`.
    pub fn fit(&mut self) -> Result<&OptimizedModel> {
        if self.state != SessionState::Configured {
            return Err(Error::InvalidState { operation: "fit", state: self.state.as_str() });
        }
        let source = self.preflight()?;
        let model = self
            .model
            .take()
            .ok_or(Error::InvalidState { operation: "fit", state: self.state.as_str() })?;

        self.state = SessionState::Fitting;
        info!(source = source.as_deref().unwrap_or("<in-memory>"), "fit started");
        let outcome = self
            .check_components(&model)
            .and_then(|()| self.run_components(model, source));
        match outcome {
            Ok(optimized) => {
                self.state = SessionState::Fitted;
                info!(parameters = optimized.model().num_parameters(), "fit finished");
                let optimized: &OptimizedModel = self.result.insert(optimized);
                Ok(optimized)
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "fit failed");
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Persist the fitted model into `dir`.
    ///
    /// # Errors
    ///
    /// `InvalidState` before a successful `fit()`, `Io` on write failure.
    pub fn save_pretrained(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let Some(result) = self.result.as_ref().filter(|_| self.state.has_result()) else {
            return Err(Error::InvalidState { operation: "save", state: self.state.as_str() });
        };
        result.save_pretrained(dir)?;
        self.state = SessionState::Saved;
        Ok(())
    }
}
