//! Remote completion service used for reviews and test generation
//!
//! Speaks the OpenAI-compatible chat-completions protocol. DeepSeek is the
//! default backend; OpenAI, OpenRouter and a local Ollama server work the
//! same way. Keys are read from the environment or the user config.
//!
//! # Environment Variables
//!
//! - `DEEPSEEK_API_KEY`: DeepSeek backend (default)
//! - `OPENAI_API_KEY`: OpenAI backend
//! - `OPENROUTER_API_KEY`: OpenRouter backend
//! - `OLLAMA_MODEL`: model name for the local Ollama backend (no key needed)
//!
//! # Example
//!
//! ```rust,ignore
//! use jreview::ai::{AiClient, CodeAssistant, LlmBackend};
//!
//! let client = AiClient::from_env(LlmBackend::DeepSeek)?;
//! let review = client.review(&java_source)?;
//! ```

mod client;
mod prompts;

pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};
pub use prompts::{extract_code_block, extract_updated_code, PromptTemplate, UPDATED_CODE_MARKER};

use thiserror::Error;

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AiResult<T> = Result<T, AiError>;

/// What the review pipeline needs from a completion service
pub trait CodeAssistant: Send + Sync {
    /// Review `code`, suggest improvements, and return the service's answer.
    fn review(&self, code: &str) -> AiResult<String>;

    /// Produce a unit-test class for `code`.
    fn unit_test(&self, code: &str) -> AiResult<String>;
}

impl CodeAssistant for AiClient {
    fn review(&self, code: &str) -> AiResult<String> {
        self.generate(
            vec![Message::user(PromptTemplate::review_request(code))],
            Some(PromptTemplate::REVIEW_SYSTEM),
        )
    }

    fn unit_test(&self, code: &str) -> AiResult<String> {
        self.generate(
            vec![Message::user(PromptTemplate::unit_test_request(code))],
            Some(PromptTemplate::UNIT_TEST_SYSTEM),
        )
    }
}
