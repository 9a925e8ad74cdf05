use super::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Local models served by Ollama's `/api/generate`
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    /// `"json"` switches Ollama into constrained JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model,
            http,
        })
    }

    fn body<'a>(&'a self, request: &'a GenerateRequest) -> GenerateBody<'a> {
        GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            system: request.system.as_deref(),
            format: request.json.then_some("json"),
            options: request
                .max_tokens
                .map(|num_predict| GenerateOptions { num_predict }),
        }
    }

    async fn call(&self, request: &GenerateRequest) -> LlmResult<GenerateReply> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| LlmError::ApiError(e.to_string()))?
            .error_for_status()
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();

        let reply = tokio::time::timeout(request.timeout, self.call(&request))
            .await
            .map_err(|_| LlmError::Timeout(request.timeout))??;

        Ok(GenerateResponse {
            text: reply.response.trim().to_string(),
            metadata: ResponseMetadata {
                provider: self.name().to_string(),
                model: self.model.clone(),
                tokens_used: reply.eval_count,
                latency_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
