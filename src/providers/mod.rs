/*!
 * Provider plumbing for remote chat-completion models.
 *
 * - `gateway`: resolves a logical provider name to connection parameters
 * - `openai`: OpenAI-compatible chat-completions client (DeepSeek, Qwen, ...)
 * - `mock`: in-process client with scripted behavior for tests and benches
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;

pub mod gateway;
pub mod mock;
pub mod openai;

pub use gateway::{ProviderGateway, ResolvedProvider};

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One request/response exchange with a model
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt
    pub system_prompt: String,
    /// User content
    pub user_content: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Ask the model for a JSON object reply
    pub json_mode: bool,
}

impl CompletionRequest {
    /// Create a plain-text request
    pub fn new(
        system_prompt: impl Into<String>,
        user_content: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: user_content.into(),
            temperature,
            json_mode: false,
        }
    }

    /// Request a JSON object reply
    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Messages in wire order
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(self.user_content.clone()),
        ]
    }
}

/// Common trait for clients able to run a chat completion
///
/// Implementations perform exactly one round trip; retries, if any,
/// belong to the caller.
#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    /// Complete a request against the given provider and return the reply text
    async fn complete(
        &self,
        provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError>;
}

/// Shared, type-erased client handle
pub type SharedClient = Arc<dyn CompletionClient>;

/// Run `complete` with an upper bound on the wait.
/// An elapsed bound is reported as `ProviderError::Timeout`.
pub async fn complete_with_timeout(
    client: &dyn CompletionClient,
    provider: &ResolvedProvider,
    request: &CompletionRequest,
    timeout: Duration,
) -> Result<String, ProviderError> {
    match tokio::time::timeout(timeout, client.complete(provider, request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}
