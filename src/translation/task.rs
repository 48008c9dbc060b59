/*!
 * Paragraph translation task.
 *
 * One task per paragraph, driven through
 * `Pending -> Translating -> (Refining) -> Done`. Every failure is captured
 * into the resulting unit, so a task never aborts its siblings.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::document::Paragraph;
use crate::errors::ProviderError;
use crate::providers::{complete_with_timeout, CompletionRequest, ResolvedProvider, SharedClient};

use super::prompts;
use super::terms;
use super::unit::{InitialOutcome, RefineOutcome, TranslationUnit};

/// Settings shared by every task of a batch
#[derive(Debug, Clone)]
pub struct TaskSettings {
    /// Source language label, if known
    pub source_language: Option<String>,
    /// Target language label
    pub target_language: String,
    /// Extra stage-1 instruction
    pub translate_instruction: Option<String>,
    /// Extra stage-2 instruction
    pub refine_instruction: Option<String>,
    /// Sampling temperature for both stages
    pub temperature: f32,
    /// Run the refinement stage
    pub enhance: bool,
}

/// Everything a task needs, shared across the batch
#[derive(Debug)]
pub struct TaskContext {
    /// Client used for both stages
    pub client: SharedClient,
    /// Provider for stage 1
    pub primary: ResolvedProvider,
    /// Provider for stage 2
    pub refiner: ResolvedProvider,
    /// Glossary terms to mark; empty disables marking
    pub terms: Vec<String>,
    /// Upper bound on each remote call
    pub request_timeout: Duration,
    /// Prompt and stage settings
    pub settings: TaskSettings,
}

impl TaskContext {
    async fn complete(
        &self,
        provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let reply =
            complete_with_timeout(self.client.as_ref(), provider, request, self.request_timeout)
                .await?;
        if reply.trim().is_empty() {
            return Err(ProviderError::ParseError(
                "Model returned an empty reply".to_string(),
            ));
        }
        Ok(reply)
    }
}

/// Lifecycle of a paragraph task
#[derive(Debug)]
enum TaskState {
    Pending,
    Translating,
    Refining { initial: String },
    Done(TranslationUnit),
}

/// Two-stage unit of work for one paragraph
#[derive(Debug)]
pub struct ParagraphTask {
    paragraph: Paragraph,
    context: Arc<TaskContext>,
}

impl ParagraphTask {
    /// Create a task
    pub fn new(paragraph: Paragraph, context: Arc<TaskContext>) -> Self {
        Self { paragraph, context }
    }

    /// Drive the task to completion
    pub async fn run(self) -> TranslationUnit {
        let mut state = TaskState::Pending;
        loop {
            state = match state {
                TaskState::Pending => TaskState::Translating,
                TaskState::Translating => match self.translate().await {
                    InitialOutcome::Translated(initial) if self.context.settings.enhance => {
                        TaskState::Refining { initial }
                    }
                    InitialOutcome::Translated(initial) => {
                        TaskState::Done(self.finish(initial, RefineOutcome::Skipped))
                    }
                    InitialOutcome::Failed(error) => {
                        TaskState::Done(TranslationUnit::failed(&self.paragraph, &error))
                    }
                },
                TaskState::Refining { initial } => {
                    let refine = self.refine(&initial).await;
                    TaskState::Done(self.finish(initial, refine))
                }
                TaskState::Done(unit) => return unit,
            };
        }
    }

    async fn translate(&self) -> InitialOutcome {
        let settings = &self.context.settings;
        let request = prompts::translation_request(
            &self.paragraph.text,
            settings.source_language.as_deref(),
            &settings.target_language,
            settings.translate_instruction.as_deref(),
            settings.temperature,
        );

        match self.context.complete(&self.context.primary, &request).await {
            Ok(text) => InitialOutcome::Translated(text),
            Err(e) => {
                warn!(
                    "Paragraph {} ('{}...') failed to translate: {}",
                    self.paragraph.index,
                    preview(&self.paragraph.text),
                    e
                );
                InitialOutcome::Failed(e)
            }
        }
    }

    async fn refine(&self, initial: &str) -> RefineOutcome {
        let settings = &self.context.settings;
        let request = prompts::refinement_request(
            &self.paragraph.text,
            initial,
            &settings.target_language,
            settings.refine_instruction.as_deref(),
            settings.temperature,
        );

        match self.context.complete(&self.context.refiner, &request).await {
            Ok(text) => RefineOutcome::Refined(text),
            Err(e) => {
                warn!(
                    "Paragraph {} ('{}...') failed to refine, keeping initial translation: {}",
                    self.paragraph.index,
                    preview(&self.paragraph.text),
                    e
                );
                RefineOutcome::Failed(e)
            }
        }
    }

    fn finish(&self, initial: String, refine: RefineOutcome) -> TranslationUnit {
        // Marking runs on the source text only
        let marking = (!self.context.terms.is_empty())
            .then(|| terms::mark(&self.paragraph.text, &self.context.terms));
        debug!("Paragraph {} done", self.paragraph.index);
        TranslationUnit::translated(&self.paragraph, initial, refine, marking)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(30).collect()
}
