//! Hub-backed file resolution with authentication and caching.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves `(identifier, file)` pairs to local paths.
///
/// An identifier is either a local directory or an `org/name` repository on
/// the hub. Remote files land in the hub cache and are returned from there.
#[derive(Debug, Clone)]
pub struct HubFetcher {
    token: Option<String>,
    cache_dir: PathBuf,
    revision: String,
    offline: bool,
}

impl Default for HubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HubFetcher {
    /// Fetcher using `HF_TOKEN` (or `~/.huggingface/token`) and the default cache.
    ///
    /// Setting `HF_HUB_OFFLINE=1` disables remote lookups.
    pub fn new() -> Self {
        let offline = std::env::var("HF_HUB_OFFLINE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);
        Self {
            token: Self::resolve_token(),
            cache_dir: Self::default_cache_dir(),
            revision: "main".into(),
            offline,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Resolve token from multiple sources
    ///
    /// Priority:
    /// 1. HF_TOKEN environment variable
    /// 2. ~/.huggingface/token file
    #[must_use]
    pub fn resolve_token() -> Option<String> {
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }

        let token_path = dirs::home_dir()?.join(".huggingface").join("token");
        let token = std::fs::read_to_string(token_path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub(crate) fn default_cache_dir() -> PathBuf {
        dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache")).join("huggingface").join("hub")
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Split `org/name`, rejecting anything that could be a relative path.
    pub fn parse_repo_id(repo_id: &str) -> Option<(&str, &str)> {
        let (org, name) = repo_id.split_once('/')?;
        let valid = |part: &str| {
            !part.is_empty()
                && part != "."
                && part != ".."
                && part.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
        };
        (valid(org) && valid(name)).then_some((org, name))
    }

    /// Locate `file` under `identifier`.
    ///
    /// A local directory is searched first. Anything else that looks like a
    /// repository id is fetched from the hub unless offline.
    pub fn resolve_file(&self, identifier: &str, file: &str) -> Result<PathBuf> {
        let local = Path::new(identifier);
        if local.is_dir() {
            let candidate = local.join(file);
            return if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(Error::not_found(file, identifier))
            };
        }

        if self.offline || Self::parse_repo_id(identifier).is_none() {
            return Err(Error::not_found(file, identifier));
        }
        self.fetch(identifier, file)
    }

    /// Download one file from a hub repository into the cache.
    pub fn fetch(&self, repo_id: &str, file: &str) -> Result<PathBuf> {
        debug!(repo_id, file, revision = %self.revision, "fetching from hub");
        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .with_token(self.token.clone())
            .with_progress(false)
            .build()
            .map_err(|e| Error::Hub { message: format!("failed to initialise hub client: {e}") })?;

        let repo = api.repo(hf_hub::Repo::with_revision(
            repo_id.to_string(),
            hf_hub::RepoType::Model,
            self.revision.clone(),
        ));

        repo.get(file).map_err(|e| {
            let message = e.to_string();
            if message.contains("404") {
                Error::not_found(file, repo_id)
            } else {
                Error::Hub { message: format!("download of {repo_id}/{file} failed: {message}") }
            }
        })
    }
}
