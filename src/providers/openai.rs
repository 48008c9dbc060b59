use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, CompletionClient, CompletionRequest, ResolvedProvider};
use crate::errors::ProviderError;

/// Client for OpenAI-compatible chat-completion APIs
///
/// One client serves every provider: the endpoint, key and model come
/// from the `ResolvedProvider` passed with each call.
#[derive(Debug, Clone)]
pub struct OpenAICompatible {
    /// HTTP client for API requests
    client: Client,
    /// Transport-level timeout, used when reporting elapsed requests
    timeout: Duration,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// The model to use
    model: String,

    /// The conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    temperature: f32,

    /// Structured output switch
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// `response_format` object
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Generated choices
    pub choices: Vec<ChatChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message
    pub message: ChoiceMessage,
}

/// Assistant message; `content` may be null on some providers
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
}

impl ChatCompletionRequest {
    /// Build the wire request for a provider
    pub fn new(provider: &ResolvedProvider, request: &CompletionRequest) -> Self {
        Self {
            model: provider.model.clone(),
            messages: request.messages(),
            temperature: request.temperature,
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

impl OpenAICompatible {
    /// Create a new client with the given transport timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            timeout,
        }
    }

    /// URL of the chat completions route for an endpoint
    pub fn completions_url(endpoint: &str) -> String {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }

    /// Extract text from a response
    pub fn extract_text(response: &ChatCompletionResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("Response contains no message content".to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else if e.is_connect() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatible {
    async fn complete(
        &self,
        provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let api_url = Self::completions_url(&provider.endpoint);
        let body = ChatCompletionRequest::new(provider, request);

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&provider.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("{} API error ({}): {}", provider.name, status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationError(error_text)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::extract_text(&parsed)
    }
}
