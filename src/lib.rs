/*!
 * # doctran - concurrent two-stage document translation
 *
 * A Rust library and server that translates documents paragraph by paragraph
 * through OpenAI-compatible chat models.
 *
 * ## Features
 *
 * - Extract paragraphs from DOCX or plain-text documents
 * - Translate every paragraph concurrently, with an optional refinement pass
 *   by a second provider
 * - Stream per-paragraph progress as results complete, then the full ordered result
 * - Mark glossary terms in the source text for the reader
 * - Keep a glossary and a translation history in SQLite
 * - Extract candidate glossary terms from a document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Paragraph extraction
 * - `translation`: Translation services:
 *   - `translation::core`: Single-text translation and the service entry point
 *   - `translation::batch`: Concurrent document batches
 *   - `translation::terms`: Glossary term marking
 *   - `translation::extraction`: Glossary term extraction
 * - `providers`: Completion clients and provider resolution
 * - `database`: Glossary and history persistence
 * - `server`: HTTP and WebSocket surface
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod document;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod server;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{DatabaseConnection, Repository};
pub use document::{extract_paragraphs, Paragraph};
pub use errors::{AppError, DocumentError, ProviderError, SinkError, StoreError};
pub use translation::{BatchEvent, BatchOutcome, BatchRequest, TranslationService, TranslationUnit};
