//! User-level configuration for jreview
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/jreview/config.toml

use crate::ai::{AiClient, AiConfig, AiError, AiResult, LlmBackend};
use crate::classifier::{ClassifierConfig, TrainConfig};
use crate::store::default_models_dir;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub models: ModelSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AiSettings {
    /// "deepseek" (default), "openai", "openrouter" or "ollama"
    pub backend: Option<String>,

    /// Model name; each backend has its own default
    pub model: Option<String>,

    /// Endpoint override for proxies or self-hosted gateways
    pub api_url: Option<String>,

    pub deepseek_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,

    /// Ollama model (default: deepseek-coder:6.7b)
    pub ollama_model: Option<String>,

    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModelSettings {
    /// Where trained classifier artifacts are kept
    pub dir: Option<PathBuf>,

    /// Number of style clusters (default: 3)
    pub style_clusters: Option<usize>,

    /// k-means seed (default: 42)
    pub seed: Option<u64>,

    /// Training budget per model, in seconds (default: 30)
    pub training_timeout_secs: Option<u64>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/jreview/config.toml)
    ///
    /// A config file that fails to parse is skipped with a warning.
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match Self::load_from(&path) {
                Ok(user_config) => config.merge(user_config),
                Err(e) => tracing::warn!("Ignoring {}: {:#}", path.display(), e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a single config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("jreview").join("config.toml"))
    }

    /// Environment variables override file settings
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let keys = [
            (LlmBackend::DeepSeek, &mut self.ai.deepseek_api_key),
            (LlmBackend::OpenAi, &mut self.ai.openai_api_key),
            (LlmBackend::OpenRouter, &mut self.ai.openrouter_api_key),
            (LlmBackend::Ollama, &mut self.ai.ollama_model),
        ];
        for (backend, slot) in keys {
            if let Some(value) = var(backend.env_key()).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        fn take<T>(base: &mut Option<T>, other: Option<T>) {
            if other.is_some() {
                *base = other;
            }
        }

        let ai = other.ai;
        take(&mut self.ai.backend, ai.backend);
        take(&mut self.ai.model, ai.model);
        take(&mut self.ai.api_url, ai.api_url);
        take(&mut self.ai.deepseek_api_key, ai.deepseek_api_key);
        take(&mut self.ai.openai_api_key, ai.openai_api_key);
        take(&mut self.ai.openrouter_api_key, ai.openrouter_api_key);
        take(&mut self.ai.ollama_model, ai.ollama_model);
        take(&mut self.ai.max_tokens, ai.max_tokens);
        take(&mut self.ai.temperature, ai.temperature);

        let models = other.models;
        take(&mut self.models.dir, models.dir);
        take(&mut self.models.style_clusters, models.style_clusters);
        take(&mut self.models.seed, models.seed);
        take(&mut self.models.training_timeout_secs, models.training_timeout_secs);
    }

    /// Configured backend, DeepSeek when unset
    pub fn backend(&self) -> AiResult<LlmBackend> {
        self.ai
            .backend
            .as_deref()
            .map_or(Ok(LlmBackend::default()), str::parse)
    }

    pub fn api_key(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::DeepSeek => self.ai.deepseek_api_key.as_deref(),
            LlmBackend::OpenAi => self.ai.openai_api_key.as_deref(),
            LlmBackend::OpenRouter => self.ai.openrouter_api_key.as_deref(),
            LlmBackend::Ollama => None,
        }
    }

    /// Request settings for `backend`; a CLI `model` beats the config file.
    pub fn ai_config(&self, backend: LlmBackend, model: Option<&str>) -> AiConfig {
        let defaults = AiConfig::default();
        let configured_model = match backend {
            LlmBackend::Ollama => self.ai.ollama_model.as_deref().or(self.ai.model.as_deref()),
            _ => self.ai.model.as_deref(),
        };
        AiConfig {
            backend,
            model: model.or(configured_model).map(str::to_string),
            api_url: self.ai.api_url.clone(),
            max_tokens: self.ai.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.ai.temperature.unwrap_or(defaults.temperature),
        }
    }

    /// Build a client. `api_key` (from the command line) wins over config and
    /// environment; hosted backends fail without any key.
    pub fn ai_client(
        &self,
        backend: Option<&str>,
        model: Option<&str>,
        api_key: Option<&str>,
    ) -> AiResult<AiClient> {
        let backend = match backend {
            Some(name) => name.parse()?,
            None => self.backend()?,
        };
        let config = self.ai_config(backend, model);

        if !backend.requires_api_key() {
            return Ok(AiClient::new(config, "ollama"));
        }

        let key = api_key
            .filter(|k| !k.is_empty())
            .or(self.api_key(backend))
            .ok_or_else(|| AiError::MissingApiKey {
                env_var: backend.env_key().to_string(),
                signup_url: backend.signup_url().to_string(),
            })?;
        Ok(AiClient::new(config, key))
    }

    /// `--models-dir` beats the config file, which beats the platform default.
    pub fn models_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.models.dir.clone())
            .unwrap_or_else(default_models_dir)
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        let mut config = ClassifierConfig::default();
        if let Some(k) = self.models.style_clusters {
            config.style = config.style.with_clusters(k);
        }
        if let Some(seed) = self.models.seed {
            config.style = config.style.with_seed(seed);
        }
        if let Some(secs) = self.models.training_timeout_secs {
            config.train = TrainConfig {
                timeout: Duration::from_secs(secs),
            };
        }
        config
    }

    /// TOML rendering with every API key masked
    pub fn to_masked_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        for key in [
            &mut shown.ai.deepseek_api_key,
            &mut shown.ai.openai_api_key,
            &mut shown.ai.openrouter_api_key,
        ] {
            if let Some(k) = key.as_mut() {
                *k = mask_key(k);
            }
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::write_example(&config_path)?;
        Ok(config_path)
    }

    /// Write the commented example config unless `path` already exists.
    /// Returns whether a file was written.
    pub fn write_example(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let example = r#"# jreview User Configuration

[ai]
# Backend: "deepseek" (default), "openai", "openrouter" or "ollama" (free, local)
# backend = "deepseek"
# model = "deepseek-code"

# Keys can also come from DEEPSEEK_API_KEY / OPENAI_API_KEY / OPENROUTER_API_KEY
# deepseek_api_key = "sk-..."
# openai_api_key = "sk-..."
# openrouter_api_key = "sk-or-..."

# For Ollama (runs locally, no key)
# ollama_model = "deepseek-coder:6.7b"

# max_tokens = 4096
# temperature = 0.2

[models]
# dir = "/path/to/models"
# style_clusters = 3
# seed = 42
# training_timeout_secs = 30
"#;
        std::fs::write(path, example)?;
        Ok(true)
    }
}

/// `sk-abcdef123456` → `sk-a…3456`; short keys are fully hidden.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
