//! Locating and parsing optimization configs.

use std::path::Path;
use tracing::{debug, info};

use super::OptimizationConfig;
use crate::error::{Error, Result};
use crate::hub::HubFetcher;

/// Loads an [`OptimizationConfig`] from an identifier.
///
/// The identifier may be:
/// - a YAML or JSON file,
/// - a directory holding `optimization.yml` (or the configured file name),
/// - an `org/name` hub repository holding that file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file_name: String,
    fetcher: HubFetcher,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub const DEFAULT_FILE_NAME: &'static str = "optimization.yml";

    pub fn new() -> Self {
        Self { file_name: Self::DEFAULT_FILE_NAME.to_string(), fetcher: HubFetcher::new() }
    }

    /// File looked up inside directories and repositories.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: HubFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Load and validate the config at `identifier`.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing exists there, `MalformedConfig` if the file does
    /// not parse into the schema or fails validation.
    pub fn load(&self, identifier: &str) -> Result<OptimizationConfig> {
        let path = if Path::new(identifier).is_file() {
            Path::new(identifier).to_path_buf()
        } else {
            self.fetcher.resolve_file(identifier, &self.file_name)?
        };
        debug!(identifier, path = %path.display(), "reading optimization config");

        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let config = if is_json {
            OptimizationConfig::from_json(&text, identifier)?
        } else {
            OptimizationConfig::from_yaml(&text, identifier)?
        };

        info!(
            identifier,
            quantization = config.quantization().is_some(),
            pruning = config.pruning().is_some(),
            distillation = config.distillation().is_some(),
            "loaded optimization config"
        );
        Ok(config)
    }
}
