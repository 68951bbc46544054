//! Configuration types.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::llm::{LlmBackend, LlmConfig};
use crate::recommend::ProductCatalog;

/// Default system prompt for the intake conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Vitta, a friendly and patient assistant helping people in Indonesia find \
micro-insurance that fits their life.

Your goal is to understand the user's situation before anything is recommended:
- what they do for a living
- roughly how much they earn (low, medium or high)
- how many dependents they support
- what worries them most (accidents, health, education for their children, their business, ...)
- whether they want sharia-compliant products

Guidelines:
- Be warm and conversational. Reply in the user's language.
- Ask ONE question at a time, focusing on what is still unknown.
- Do not recommend specific products yourself. Product matches are added to the \
conversation automatically once the picture is complete.";

/// Telegram bot settings. Present only when a bot token is configured.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: secrecy::SecretString,
    /// Usernames or numeric user ids allowed to chat. `*` allows everyone.
    pub allowed_users: Vec<String>,
}

impl TelegramConfig {
    pub fn allows_everyone(&self) -> bool {
        self.allowed_users.iter().any(|u| u == "*")
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// System prompt prepended to every LLM call.
    pub system_prompt: String,
    /// Number of most recent turns sent to the LLM.
    pub history_window: usize,
    /// Catalog file overriding the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Serve the HTTP API on this port when set.
    pub http_port: Option<u16>,
    /// Run the Telegram channel when set.
    pub telegram: Option<TelegramConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_window: 10,
            catalog_path: None,
            http_port: None,
            telegram: None,
        }
    }
}

fn invalid(key: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Read configuration through a lookup function, one key at a time.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let backend = match get("VITTA_LLM_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|e| invalid("VITTA_LLM_BACKEND", e))?,
            None => defaults.llm.backend,
        };

        let api_key = get("OPENAI_API_KEY").map(secrecy::SecretString::from);
        if backend == LlmBackend::OpenAi && api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()));
        }

        let temperature = match get("VITTA_TEMPERATURE") {
            Some(raw) => {
                let t: f32 = raw.parse().map_err(|e| invalid("VITTA_TEMPERATURE", e))?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(invalid("VITTA_TEMPERATURE", "must be between 0 and 2"));
                }
                t
            }
            None => defaults.llm.temperature,
        };

        let history_window = match get("VITTA_HISTORY_WINDOW") {
            Some(raw) => {
                let n: usize = raw.parse().map_err(|e| invalid("VITTA_HISTORY_WINDOW", e))?;
                if n == 0 {
                    return Err(invalid("VITTA_HISTORY_WINDOW", "must be at least 1"));
                }
                n
            }
            None => defaults.history_window,
        };

        let max_tokens = match get("VITTA_MAX_TOKENS") {
            Some(raw) => {
                let n: u32 = raw.parse().map_err(|e| invalid("VITTA_MAX_TOKENS", e))?;
                if n == 0 {
                    return Err(invalid("VITTA_MAX_TOKENS", "must be at least 1"));
                }
                Some(n)
            }
            None => None,
        };

        let http_port = get("VITTA_HTTP_PORT")
            .map(|raw| raw.parse::<u16>().map_err(|e| invalid("VITTA_HTTP_PORT", e)))
            .transpose()?;

        let telegram = get("TELEGRAM_BOT_TOKEN").map(|token| TelegramConfig {
            bot_token: secrecy::SecretString::from(token),
            allowed_users: get("TELEGRAM_ALLOWED_USERS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        });

        Ok(Self {
            llm: LlmConfig {
                backend,
                model: get("VITTA_MODEL").unwrap_or_else(|| backend.default_model().to_string()),
                ollama_url: get("VITTA_OLLAMA_URL").unwrap_or(defaults.llm.ollama_url),
                api_key,
                temperature,
                max_tokens,
            },
            system_prompt: get("VITTA_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            history_window,
            catalog_path: get("VITTA_CATALOG_PATH").map(PathBuf::from),
            http_port,
            telegram,
        })
    }

    /// The configured catalog file, or the built-in catalog.
    pub fn load_catalog(&self) -> Result<ProductCatalog> {
        let catalog = match &self.catalog_path {
            Some(path) => ProductCatalog::load(path)?,
            None => ProductCatalog::builtin()?,
        };
        tracing::info!(products = catalog.len(), version = catalog.version(), "Catalog loaded");
        Ok(catalog)
    }
}
