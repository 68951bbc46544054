//! LLM integration for Vitta.
//!
//! Supports:
//! - **Ollama**: a local model over `/api/generate`
//! - **OpenAI**: chat completions over HTTPS
//!
//! Both speak plain HTTP through `reqwest` and sit behind the `LlmProvider`
//! trait, so the chat layer never knows which one it is talking to.

pub mod ollama;
pub mod openai;
pub mod provider;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
    OpenAi,
}

impl LlmBackend {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "mistral",
            Self::OpenAi => "gpt-4.1-mini",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown LLM backend: {other} (expected ollama or openai)")),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Required for the OpenAI backend.
    pub api_key: Option<secrecy::SecretString>,
    pub temperature: f32,
    /// Reply length cap passed to the backend, if any.
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            model: LlmBackend::Ollama.default_model().to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, crate::error::ConfigError> {
    match config.backend {
        LlmBackend::Ollama => {
            tracing::info!("Using Ollama at {} (model: {})", config.ollama_url, config.model);
            Ok(Arc::new(OllamaProvider::new(&config.ollama_url, &config.model)))
        }
        LlmBackend::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| crate::error::ConfigError::MissingEnvVar("OPENAI_API_KEY".into()))?;
            tracing::info!("Using OpenAI (model: {})", config.model);
            Ok(Arc::new(OpenAiProvider::new(api_key, &config.model)))
        }
    }
}
