//! Client Configuration
//!
//! Defines the configuration for talking to the Remyx engine including:
//! - API credential and base URL (from the process environment)
//! - Optional settings file (`~/.remyxai/config.toml`)
//! - Supported model allow-list for MyxBoards
//! - Polling cadence for evaluation jobs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "REMYXAI_API_KEY";
pub const BASE_URL_ENV: &str = "REMYXAI_BASE_URL";
pub const CONFIG_PATH_ENV: &str = "REMYXAI_CONFIG";
pub const DEFAULT_BASE_URL: &str = "https://engine.remyx.ai/api/v1.0";

const CONFIG_DIR_NAME: &str = ".remyxai";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Connection settings for the Remyx engine, built once at process start
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credential
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(Settings::default().request_timeout_secs),
        }
    }

    /// Read the credential and endpoint from the environment.
    ///
    /// A missing `REMYXAI_API_KEY` is a startup failure, not something to retry.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(&Settings::default())
    }

    /// Like [`ClientConfig::from_env`], falling back to `settings` for anything
    /// the environment does not set.
    pub fn from_env_with(settings: &Settings) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} not found. Please set it with your API key.",
                    API_KEY_ENV
                ))
            })?;

        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| settings.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(api_key, base_url);
        config.request_timeout = Duration::from_secs(settings.request_timeout_secs);
        Ok(config)
    }
}

/// Optional on-disk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Override for the API root
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Interval between job status polls
    pub poll_interval_secs: u64,
    /// Replaces the built-in allow-list when set
    pub supported_models: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 60,
            poll_interval_secs: 30,
            supported_models: None,
        }
    }
}

impl Settings {
    /// `$REMYXAI_CONFIG`, else `~/.remyxai/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid settings file {}: {}", path.display(), e)))
    }

    pub fn supported_models(&self) -> SupportedModels {
        match &self.supported_models {
            Some(models) => SupportedModels::new(models.iter().cloned()),
            None => SupportedModels::default(),
        }
    }
}

/// Models the engine can evaluate on a MyxBoard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedModels {
    models: HashSet<String>,
}

impl Default for SupportedModels {
    fn default() -> Self {
        Self::new(
            [
                "Phi-3-mini-4k-instruct",
                "Phi-3-mini-128k-instruct",
                "Qwen2-0.5B",
                "Qwen2-0.5B-Instruct",
                "Qwen2-1.5B",
                "Qwen2-1.5B-Instruct",
                "Qwen2-7B-Instruct",
                "gemma-2b",
                "gemma-1.1-2b-it",
                "Meta-Llama-3-8B-Instruct",
                "Mistral-7B-Instruct-v0.3",
                "TinyLlama-1.1B-Chat-v1.0",
            ]
            .iter()
            .map(|m| m.to_string()),
        )
    }
}

impl SupportedModels {
    pub fn new(models: impl IntoIterator<Item = String>) -> Self {
        Self {
            models: models.into_iter().collect(),
        }
    }

    /// Strip the organisation from a Hugging Face repo id (`org/name` -> `name`)
    pub fn engine_name(model: &str) -> &str {
        match model.split_once('/') {
            Some((_, name)) => name,
            None => model,
        }
    }

    pub fn is_supported(&self, model: &str) -> bool {
        self.models.contains(Self::engine_name(model))
    }

    /// Check a whole model list, reporting every unsupported entry at once
    pub fn validate(&self, models: &[String]) -> Result<()> {
        if models.is_empty() {
            return Err(Error::EmptyBoard);
        }
        let unsupported: Vec<String> = models
            .iter()
            .filter(|m| !self.is_supported(m))
            .cloned()
            .collect();
        if !unsupported.is_empty() {
            return Err(Error::UnsupportedModels(unsupported));
        }
        debug!(?models, "validated models");
        Ok(())
    }

    /// Sorted for stable display
    pub fn list(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.models.iter().map(String::as_str).collect();
        models.sort_unstable();
        models
    }
}
