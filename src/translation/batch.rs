/*!
 * Batch translation processing.
 *
 * The orchestrator fans out one `ParagraphTask` per paragraph over a bounded
 * pool, reports each unit as it completes, and finishes with a single `done`
 * event whose results are in paragraph order whatever the completion order.
 */

use futures::stream::{self, StreamExt};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::{default_provider_name, default_target_language, default_temperature};
use crate::document::Paragraph;
use crate::providers::{ProviderGateway, SharedClient};

use super::concurrency::ProviderProfile;
use super::events::{BatchEvent, EventSink};
use super::task::{ParagraphTask, TaskContext, TaskSettings};
use super::unit::{GlossaryEntry, TranslationUnit};

/// Configuration for one batch, as sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Provider for the initial translation
    #[serde(default = "default_provider_name")]
    pub primary_provider: String,

    /// Provider for the refinement
    #[serde(default = "default_provider_name")]
    pub optimized_provider: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Extra instruction appended to the translation prompt
    #[serde(default)]
    pub prompt_translate: Option<String>,

    /// Extra instruction appended to the refinement prompt
    #[serde(default)]
    pub prompt_optimized: Option<String>,

    /// Source language label
    #[serde(default)]
    pub lang: Option<String>,

    /// Target language label
    #[serde(default = "default_target_language")]
    pub target_lang: String,

    /// Run the refinement stage
    #[serde(default)]
    pub enhance: bool,

    /// Glossary snapshot to mark in the source text
    #[serde(default)]
    pub terms: Vec<GlossaryEntry>,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            primary_provider: default_provider_name(),
            optimized_provider: default_provider_name(),
            temperature: default_temperature(),
            prompt_translate: None,
            prompt_optimized: None,
            lang: None,
            target_lang: default_target_language(),
            enhance: false,
            terms: Vec::new(),
        }
    }
}

impl BatchRequest {
    fn settings(&self) -> TaskSettings {
        TaskSettings {
            source_language: self.lang.clone(),
            target_language: self.target_lang.clone(),
            translate_instruction: self.prompt_translate.clone(),
            refine_instruction: self.prompt_optimized.clone(),
            temperature: self.temperature,
            enhance: self.enhance,
        }
    }

    fn term_list(&self) -> Vec<String> {
        self.terms.iter().map(|entry| entry.term.clone()).collect()
    }
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every progress event and the done event were delivered
    Completed {
        /// Number of paragraphs
        total: usize,
    },
    /// The sink went away; nothing further was emitted
    SinkClosed {
        /// Units finished before the disconnect
        completed: usize,
        /// Number of paragraphs
        total: usize,
    },
    /// The caller cancelled the batch
    Cancelled {
        /// Units finished before cancellation
        completed: usize,
        /// Number of paragraphs
        total: usize,
    },
}

/// Batch orchestrator for translating a document paragraph by paragraph
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    /// Client for every remote call
    client: SharedClient,

    /// Provider lookup
    gateway: ProviderGateway,

    /// Upper bound on each remote call
    request_timeout: Duration,

    /// Pool size override; the primary provider's profile applies otherwise
    max_concurrent_requests: Option<usize>,
}

impl BatchOrchestrator {
    /// Create a new orchestrator
    pub fn new(client: SharedClient, gateway: ProviderGateway, request_timeout: Duration) -> Self {
        Self {
            client,
            gateway,
            request_timeout,
            max_concurrent_requests: None,
        }
    }

    /// Override the worker pool size
    pub fn with_max_concurrent_requests(mut self, max: Option<usize>) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Worker pool size for a batch whose stage 1 runs on `provider`
    pub fn concurrency_for(&self, provider: &str) -> usize {
        ProviderProfile::for_provider(provider)
            .effective_concurrent_requests(self.max_concurrent_requests)
    }

    /// Translate `paragraphs`, streaming events into `sink`.
    ///
    /// Emits exactly one progress event per paragraph and then one done
    /// event, unless the sink fails or `cancel` fires first; in both cases
    /// nothing more is emitted and outstanding tasks are dropped.
    pub async fn run<S>(
        &self,
        paragraphs: Vec<Paragraph>,
        request: &BatchRequest,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> BatchOutcome
    where
        S: EventSink + ?Sized,
    {
        let total = paragraphs.len();
        let primary = self.gateway.resolve(&request.primary_provider);
        let refiner = self.gateway.resolve(&request.optimized_provider);
        let concurrency = self.concurrency_for(&primary.name);

        info!(
            "Starting batch: {} paragraphs, provider {} (refine: {}), {} concurrent requests",
            total,
            primary.name,
            if request.enhance { refiner.name.as_str() } else { "off" },
            concurrency
        );
        let start_time = Instant::now();

        let context = Arc::new(TaskContext {
            client: self.client.clone(),
            primary,
            refiner,
            terms: request.term_list(),
            request_timeout: self.request_timeout,
            settings: request.settings(),
        });

        // One slot per paragraph, addressed by input position
        let mut slots: Vec<Option<TranslationUnit>> = vec![None; total];
        let mut completed = 0usize;

        let mut completions = stream::iter(paragraphs.into_iter().enumerate())
            .map(|(slot, paragraph)| {
                let task = ParagraphTask::new(paragraph, context.clone());
                async move { (slot, task.run().await) }
            })
            .buffer_unordered(concurrency);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Batch cancelled after {}/{} paragraphs", completed, total);
                    return BatchOutcome::Cancelled { completed, total };
                }
                next = completions.next() => next,
            };
            let Some((slot, unit)) = next else { break };

            completed += 1;
            let event = BatchEvent::Progress {
                current: completed,
                total,
                result: unit.clone(),
            };
            slots[slot] = Some(unit);

            if let Err(e) = sink.emit(event).await {
                info!("{} after {}/{} paragraphs", e, completed, total);
                return BatchOutcome::SinkClosed { completed, total };
            }
        }

        let results: Vec<TranslationUnit> = slots.into_iter().flatten().collect();
        if cancel.is_cancelled() {
            return BatchOutcome::Cancelled { completed, total };
        }
        if let Err(e) = sink.emit(BatchEvent::Done { total, results }).await {
            info!("{} before the done event", e);
            return BatchOutcome::SinkClosed { completed, total };
        }

        info!(
            "Batch of {} paragraphs completed in {:.2?}",
            total,
            start_time.elapsed()
        );
        BatchOutcome::Completed { total }
    }
}
