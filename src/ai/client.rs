//! Chat-completions client for OpenAI-compatible backends
//!
//! Uses ureq (sync HTTP), no async runtime needed.

use crate::ai::{AiError, AiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    DeepSeek,
    OpenAi,
    OpenRouter,
    Ollama,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::DeepSeek => "DEEPSEEK_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::OpenRouter => "OPENROUTER_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::DeepSeek => "https://platform.deepseek.com/api_keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::OpenRouter => "https://openrouter.ai/keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::DeepSeek => "deepseek-code",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::OpenRouter => "deepseek/deepseek-chat",
            LlmBackend::Ollama => "deepseek-coder:6.7b",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LlmBackend::DeepSeek => "DeepSeek",
            LlmBackend::OpenAi => "OpenAI",
            LlmBackend::OpenRouter => "OpenRouter",
            LlmBackend::Ollama => "Ollama (local)",
        }
    }
}

impl FromStr for LlmBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(LlmBackend::DeepSeek),
            "openai" => Ok(LlmBackend::OpenAi),
            "openrouter" => Ok(LlmBackend::OpenRouter),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(AiError::ConfigError(format!(
                "unknown backend '{}'. Valid backends: deepseek, openai, openrouter, ollama",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    /// Overrides the backend's endpoint (proxies, self-hosted gateways)
    pub api_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            api_url: None,
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.backend.api_url())
    }
}

/// Chat-completions client over sync ureq
pub struct AiClient {
    config: AiConfig,
    api_key: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key intentionally omitted
        f.debug_struct("AiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(std::time::Duration::from_secs(120))) // LLM calls can be slow
        .build()
        .new_agent()
}

impl AiClient {
    pub fn new(config: AiConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            agent: make_agent(),
        }
    }

    pub fn from_env(backend: LlmBackend) -> AiResult<Self> {
        let config = AiConfig {
            backend,
            ..Default::default()
        };
        Self::from_env_with_config(config)
    }

    pub fn from_env_with_config(mut config: AiConfig) -> AiResult<Self> {
        if !config.backend.requires_api_key() {
            if let Ok(model) = env::var("OLLAMA_MODEL") {
                config.model = Some(model);
            }
            return Ok(Self::new(config, "ollama"));
        }

        let env_key = config.backend.env_key();
        let api_key = env::var(env_key).map_err(|_| AiError::MissingApiKey {
            env_var: env_key.to_string(),
            signup_url: config.backend.signup_url().to_string(),
        })?;

        Ok(Self::new(config, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Generate a response (sync)
    pub fn generate(&self, mut messages: Vec<Message>, system: Option<&str>) -> AiResult<String> {
        if let Some(sys) = system {
            messages.insert(0, Message::system(sys));
        }

        let body = ChatRequest {
            model: self.config.model().to_string(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut req = self
            .agent
            .post(self.config.api_url())
            .header("Content-Type", "application/json");

        if self.config.backend.requires_api_key() {
            req = req.header("Authorization", &format!("Bearer {}", self.api_key));
        }

        tracing::debug!(
            "POST {} (model {}, {} messages)",
            self.config.api_url(),
            body.model,
            body.messages.len()
        );

        let response = req.send_json(&body).map_err(|e| AiError::ApiError {
            status: 0,
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: ChatResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        first_choice(resp)
    }
}

fn first_choice(resp: ChatResponse) -> AiResult<String> {
    resp.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| AiError::ParseError("No response choices".to_string()))
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults() {
        assert_eq!(LlmBackend::default(), LlmBackend::DeepSeek);
        assert_eq!(LlmBackend::DeepSeek.default_model(), "deepseek-code");
        assert_eq!(
            LlmBackend::DeepSeek.api_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert!(!LlmBackend::Ollama.requires_api_key());
    }

    #[test]
    fn test_config_overrides() {
        let config = AiConfig::default();
        assert_eq!(config.model(), "deepseek-code");

        let config = AiConfig {
            model: Some("deepseek-chat".to_string()),
            api_url: Some("http://127.0.0.1:9/v1/chat/completions".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model(), "deepseek-chat");
        assert_eq!(config.api_url(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("DeepSeek".parse::<LlmBackend>().unwrap(), LlmBackend::DeepSeek);
        assert_eq!("ollama".parse::<LlmBackend>().unwrap(), LlmBackend::Ollama);
        assert!("claude".parse::<LlmBackend>().is_err());
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatRequest {
            model: "deepseek-code".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            max_tokens: 16,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_parsing() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Looks good"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(resp).unwrap(), "Looks good");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(AiError::ParseError(_))));
    }

    #[test]
    fn test_unreachable_endpoint_is_an_api_error() {
        let client = AiClient::new(
            AiConfig {
                backend: LlmBackend::Ollama,
                api_url: Some("http://127.0.0.1:9/v1/chat/completions".to_string()),
                ..Default::default()
            },
            "unused",
        );
        let err = client.generate(vec![Message::user("hi")], None).unwrap_err();
        assert!(matches!(err, AiError::ApiError { status: 0, .. }));
    }
}
