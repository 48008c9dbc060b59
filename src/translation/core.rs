/*!
 * Core translation service implementation.
 *
 * `TranslationService` owns the completion client and provider table and is
 * the entry point for single-text translation, document batches and term
 * extraction.
 */

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::{
    default_provider_name, default_target_language, default_temperature, Config,
};
use crate::document::Paragraph;
use crate::errors::ProviderError;
use crate::providers::openai::OpenAICompatible;
use crate::providers::{
    complete_with_timeout, CompletionRequest, ProviderGateway, ResolvedProvider, SharedClient,
};

use super::batch::{BatchOrchestrator, BatchOutcome, BatchRequest};
use super::concurrency::ProviderProfile;
use super::events::EventSink;
use super::extraction::{ExtractedTerm, TermExtractor};
use super::prompts;

/// Request for a single piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTranslationRequest {
    /// Text to translate
    pub text: String,

    /// Source language label
    #[serde(default)]
    pub lang: Option<String>,

    /// Target language label
    #[serde(default = "default_target_language", alias = "targetLang")]
    pub target_lang: String,

    /// Run the refinement stage
    #[serde(default)]
    pub enhance: bool,

    /// Instruction appended to both system prompts
    #[serde(default, alias = "customPrompt")]
    pub custom_prompt: String,

    /// Provider for the initial translation
    #[serde(default = "default_provider_name")]
    pub primary_provider: String,

    /// Provider for the refinement, defaults to the primary one
    #[serde(default)]
    pub optimization_provider: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl TextTranslationRequest {
    /// Request with default settings
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: None,
            target_lang: default_target_language(),
            enhance: false,
            custom_prompt: String::new(),
            primary_provider: default_provider_name(),
            optimization_provider: None,
            temperature: default_temperature(),
        }
    }
}

/// Result of a single-text translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextTranslation {
    /// Both stages ran
    Enhanced {
        /// Stage-1 output
        initial: String,
        /// Stage-2 output
        optimized: String,
        /// Target language label
        #[serde(rename = "targetLang")]
        target_lang: String,
    },
    /// Stage 1 only
    Plain {
        /// Stage-1 output
        translation: String,
        /// Target language label
        #[serde(rename = "targetLang")]
        target_lang: String,
    },
}

impl TextTranslation {
    /// Best available translation
    pub fn text(&self) -> &str {
        match self {
            Self::Enhanced { optimized, .. } => optimized,
            Self::Plain { translation, .. } => translation,
        }
    }
}

/// Translation service for documents and snippets
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Client for every remote call
    client: SharedClient,

    /// Provider lookup
    gateway: ProviderGateway,

    /// Upper bound on each remote call
    request_timeout: Duration,

    /// Pool size override
    max_concurrent_requests: Option<usize>,
}

impl TranslationService {
    /// Create a service talking to the configured OpenAI-compatible providers
    pub fn new(config: &Config) -> Self {
        let timeout = config.providers.request_timeout();
        Self::with_client(config, Arc::new(OpenAICompatible::new(timeout)))
    }

    /// Create a service with an explicit client
    pub fn with_client(config: &Config, client: SharedClient) -> Self {
        Self {
            client,
            gateway: ProviderGateway::new(&config.providers),
            request_timeout: config.providers.request_timeout(),
            max_concurrent_requests: config.providers.max_concurrent_requests,
        }
    }

    /// Provider lookup
    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }

    /// Resolve a provider name
    pub fn resolve_provider(&self, name: &str) -> ResolvedProvider {
        self.gateway.resolve(name)
    }

    async fn complete(
        &self,
        provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let reply =
            complete_with_timeout(self.client.as_ref(), provider, request, self.request_timeout)
                .await?;
        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::ParseError(
                "Model returned an empty reply".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    /// Translate one text, optionally refining it.
    ///
    /// Unlike a batch, a failure at either stage is returned to the caller.
    pub async fn translate_text(
        &self,
        request: &TextTranslationRequest,
    ) -> Result<TextTranslation, ProviderError> {
        let primary = self.gateway.resolve(&request.primary_provider);
        let instruction = Some(request.custom_prompt.as_str());
        debug!(
            "Translating {} chars to {} with {}",
            request.text.chars().count(),
            request.target_lang,
            primary.name
        );

        let initial = self
            .complete(
                &primary,
                &prompts::translation_request(
                    &request.text,
                    request.lang.as_deref(),
                    &request.target_lang,
                    instruction,
                    request.temperature,
                ),
            )
            .await?;

        if !request.enhance {
            return Ok(TextTranslation::Plain {
                translation: initial,
                target_lang: request.target_lang.clone(),
            });
        }

        let refiner = self.gateway.resolve(
            request
                .optimization_provider
                .as_deref()
                .unwrap_or(&request.primary_provider),
        );
        let optimized = self
            .complete(
                &refiner,
                &prompts::refinement_request(
                    &request.text,
                    &initial,
                    &request.target_lang,
                    instruction,
                    request.temperature,
                ),
            )
            .await?;

        Ok(TextTranslation::Enhanced {
            initial,
            optimized,
            target_lang: request.target_lang.clone(),
        })
    }

    /// Orchestrator sharing this service's client and providers
    pub fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.client.clone(), self.gateway.clone(), self.request_timeout)
            .with_max_concurrent_requests(self.max_concurrent_requests)
    }

    /// Run a document batch
    pub async fn run_batch<S>(
        &self,
        paragraphs: Vec<Paragraph>,
        request: &BatchRequest,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> BatchOutcome
    where
        S: EventSink + ?Sized,
    {
        self.orchestrator().run(paragraphs, request, sink, cancel).await
    }

    /// Term extractor sized for `provider`
    pub fn term_extractor(&self, provider: &str) -> TermExtractor {
        let concurrency = ProviderProfile::for_provider(provider)
            .effective_concurrent_requests(self.max_concurrent_requests);
        TermExtractor::new(self.client.clone(), self.request_timeout, concurrency)
    }

    /// Extract glossary terms from a document
    pub async fn extract_terms(
        &self,
        paragraphs: &[Paragraph],
        provider_name: &str,
    ) -> Result<Vec<ExtractedTerm>, ProviderError> {
        let provider = self.gateway.resolve(provider_name);
        let terms = self
            .term_extractor(&provider.name)
            .extract(paragraphs, &provider)
            .await?;
        info!("Extracted {} distinct terms", terms.len());
        Ok(terms)
    }
}
