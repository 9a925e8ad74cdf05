use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use std::time::Instant;

/// Chat completions against the OpenAI API
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)),
            model,
        }
    }

    /// System instructions first (if any), then the prompt as the user turn
    fn build_request(&self, request: &GenerateRequest) -> LlmResult<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatCompletionRequestSystemMessage::from(system.as_str()).into());
        }
        messages.push(ChatCompletionRequestUserMessage::from(request.prompt.as_str()).into());

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if request.json {
            args.response_format(ResponseFormat::JsonObject);
        }
        if let Some(max_tokens) = request.max_tokens {
            args.max_tokens(max_tokens);
        }

        args.build().map_err(|e| LlmError::ConfigError(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let chat = self.build_request(&request)?;
        let start = Instant::now();

        let completion = tokio::time::timeout(request.timeout, self.client.chat().create(chat))
            .await
            .map_err(|_| LlmError::Timeout(request.timeout))?
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No content in response".to_string()))?;

        Ok(GenerateResponse {
            text: text.trim().to_string(),
            metadata: ResponseMetadata {
                provider: self.name().to_string(),
                model: self.model.clone(),
                tokens_used: completion.usage.map(|u| u.total_tokens),
                latency_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
