/*!
 * Document translation using LLM chat-completion providers.
 *
 * This module contains the translation pipeline. It is split into several submodules:
 *
 * - `core`: Service definition, single-text translation
 * - `batch`: Concurrent, order-preserving document batches
 * - `task`: Two-stage translation of one paragraph
 * - `events`: Progress/done events and their sinks
 * - `unit`: Per-paragraph results
 * - `terms`: Glossary term marking
 * - `prompts`: Prompt builders for every stage
 * - `extraction`: Glossary term extraction
 * - `concurrency`: Provider-specific pool sizes
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOrchestrator, BatchOutcome, BatchRequest};
pub use self::core::{TextTranslation, TextTranslationRequest, TranslationService};
pub use self::events::{BatchEvent, EventSink};
pub use self::extraction::{ExtractedTerm, TermExtractor};
pub use self::terms::{mark, unmark, MarkResult};
pub use self::unit::{GlossaryEntry, TranslationUnit};

// Submodules
pub mod batch;
pub mod concurrency;
pub mod core;
pub mod events;
pub mod extraction;
pub mod prompts;
pub mod task;
pub mod terms;
pub mod unit;
