//! Configuration — YAML config file + env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Known provider presets: provider name → default base URL.
const PROVIDER_PRESETS: &[(&str, Option<&str>)] = &[
    ("openai", None),
    ("openrouter", Some("https://openrouter.ai/api/v1")),
    ("ollama", Some("http://localhost:11434")),
];

/// Provider-specific API key env vars (checked before OPENAI_API_KEY fallback).
const PROVIDER_KEY_ENV_VARS: &[(&str, &str)] = &[
    ("openrouter", "OPENROUTER_API_KEY"),
    ("ollama", "OLLAMA_API_KEY"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// "openai" | "openrouter" | "ollama" | "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// LLM model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (set here or via env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the provider API (auto-set for known providers)
    #[serde(default)]
    pub base_url: Option<String>,

    /// How long a chat view waits for a reply before declaring a timeout
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,

    /// Max output tokens per LLM call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature for mediator calls
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4.1".into()
}
fn default_response_timeout() -> u64 {
    120
}
fn default_max_output_tokens() -> u32 {
    1000
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    1.0
}

impl Config {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        // Provider (env var override)
        if let Ok(p) = std::env::var("CONVENE_PROVIDER") {
            config.provider = p;
        }

        // Base URL: env var > config > provider preset
        if let Ok(url) = std::env::var("CONVENE_BASE_URL") {
            config.base_url = Some(url);
        } else if config.base_url.is_none() {
            config.base_url = PROVIDER_PRESETS
                .iter()
                .find(|(p, _)| *p == config.provider)
                .and_then(|(_, url)| url.map(String::from));
        }

        // API key: provider-specific env var > OPENAI_API_KEY > config
        let provider_key_var = PROVIDER_KEY_ENV_VARS
            .iter()
            .find(|(p, _)| *p == config.provider)
            .map(|(_, var)| *var);

        if let Some(var) = provider_key_var {
            if let Ok(key) = std::env::var(var) {
                config.api_key = Some(key);
            }
        }
        if config.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                config.api_key = Some(key);
            }
        }

        // Model (env var override)
        if let Ok(m) = std::env::var("CONVENE_MODEL") {
            config.model = m;
        }

        // Validation
        if config.provider == "custom" && config.base_url.is_none() {
            anyhow::bail!(
                "Provider 'custom' requires base_url in config.yaml or CONVENE_BASE_URL env var"
            );
        }

        Ok(config)
    }

    /// Load config from the default location (`dir`/config.yaml).
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join("config.yaml"))
    }

    /// Response wait duration for the timeout tracker.
    pub fn response_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.response_timeout_seconds)
    }

    /// Generation defaults for mediator calls.
    pub fn generation_config(&self) -> crate::types::ModelGenerationConfig {
        crate::types::ModelGenerationConfig {
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            custom_request_body_fields: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            response_timeout_seconds: default_response_timeout(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "provider: openai\nmodel: gpt-4.1").unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.response_timeout_seconds, 120);
        assert_eq!(config.max_output_tokens, 1000);
    }

    #[test]
    fn test_load_config_custom_values() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "provider: custom\nmodel: llama3\nbase_url: http://localhost:11434\nresponse_timeout_seconds: 30"
        )
        .unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.provider, "custom");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.response_timeout_seconds, 30);
        assert_eq!(config.response_timeout(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_custom_without_base_url_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "provider: custom\nmodel: llama3").unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_ollama_preset_base_url() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "provider: ollama\nmodel: llama3.2").unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434"));
    }
}
