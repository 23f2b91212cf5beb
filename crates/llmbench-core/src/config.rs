use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LlmBenchError, Result};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmBenchConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    /// Per-request timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_repeats")]
    pub repeats: u32,
    #[serde(default = "default_prompts")]
    pub prompts: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            repeats: default_repeats(),
            prompts: default_prompts(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_repeats() -> u32 {
    1
}

pub fn default_prompts() -> Vec<String> {
    vec![
        "Why is the sky blue?".to_string(),
        "Write a report on the financials of Microsoft".to_string(),
    ]
}

impl LlmBenchConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: LlmBenchConfig = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config");
        config.validate()?;
        Ok(config)
    }

    /// Apply `OLLAMA_HOST` from the environment, if set.
    pub fn with_env(mut self) -> Self {
        if let Some(host) = std::env::var("OLLAMA_HOST").ok().filter(|h| !h.trim().is_empty()) {
            self.ollama.host = normalize_host(&host);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ollama.host.trim().is_empty() {
            return Err(LlmBenchError::Config("ollama.host must not be empty".into()));
        }
        if self.defaults.repeats == 0 {
            return Err(LlmBenchError::Config("defaults.repeats must be greater than 0".into()));
        }
        if self.defaults.prompts.is_empty() {
            return Err(LlmBenchError::Config("defaults.prompts must not be empty".into()));
        }
        Ok(())
    }
}

/// Ollama accepts `OLLAMA_HOST=127.0.0.1:11434`; add a scheme and drop a trailing slash.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        return host.to_string();
    }
    format!("http://{host}")
}
