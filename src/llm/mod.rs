//! Completion providers the oracle can talk to.

mod ollama;
mod openai;

use async_trait::async_trait;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// One completion call, independent of the provider behind it
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Instructions sent ahead of the prompt
    pub system: Option<String>,
    /// Constrain the reply to a single JSON object where the provider supports it
    pub json: bool,
    pub max_tokens: Option<u32>,
    /// Exceeding this counts as a failed call
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub provider: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    fn name(&self) -> &str;
}

/// Providers in priority order
pub struct LlmManager {
    pub providers: Vec<Box<dyn LlmProvider>>,
}

impl LlmManager {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Ask each provider in order and hand every successful reply to `accept`.
    /// Returns the first reply `accept` turns into a value.
    pub async fn generate_until<T>(
        &self,
        request: &GenerateRequest,
        mut accept: impl FnMut(&GenerateResponse) -> Option<T>,
    ) -> Option<T> {
        for provider in &self.providers {
            let response = match provider.generate(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Provider {} failed: {}", provider.name(), e);
                    continue;
                }
            };
            tracing::debug!(
                "{} ({}) answered in {}ms, tokens: {:?}",
                response.metadata.provider,
                response.metadata.model,
                response.metadata.latency_ms,
                response.metadata.tokens_used
            );
            if let Some(value) = accept(&response) {
                return Some(value);
            }
            tracing::warn!("Provider {} returned an unusable reply", provider.name());
        }
        None
    }
}

/// Which providers to use and how to call them.
///
/// OpenAI is enabled by an API key; Ollama is on by default and pointed at
/// the local daemon.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    pub default_timeout: Duration,
    pub default_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 300,
        }
    }
}

/// Trimmed value of `key`; `None` when unset or blank
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_value(key).and_then(|value| value.parse().ok())
}

impl LlmConfig {
    /// OPENAI_API_KEY, OPENAI_MODEL, OLLAMA_BASE_URL, OLLAMA_MODEL,
    /// LLM_TIMEOUT (seconds) and LLM_MAX_TOKENS
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Unset keeps the local default; set-but-blank disables Ollama
        let ollama_base_url = if std::env::var_os("OLLAMA_BASE_URL").is_some() {
            env_value("OLLAMA_BASE_URL")
        } else {
            defaults.ollama_base_url
        };

        Self {
            openai_api_key: env_value("OPENAI_API_KEY"),
            openai_model: env_value("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url,
            ollama_model: env_value("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            default_timeout: env_parsed("LLM_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: env_parsed("LLM_MAX_TOKENS")
                .unwrap_or(defaults.default_max_tokens),
        }
    }

    /// OpenAI first, then Ollama. Fails when neither is configured.
    pub fn build_manager(&self) -> LlmResult<LlmManager> {
        let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

        if let Some(api_key) = &self.openai_api_key {
            providers.push(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            )));
        }
        if let Some(base_url) = &self.ollama_base_url {
            providers.push(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )?));
        }

        if providers.is_empty() {
            return Err(LlmError::ConfigError(
                "No LLM providers configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
            ));
        }

        tracing::info!(
            "LLM providers: {}",
            providers
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(LlmManager::new(providers))
    }
}
