/*!
 * Glossary term extraction.
 *
 * Asks the model for the domain terms of every paragraph, merges the answers
 * case-insensitively and counts how often each term occurs in the document.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::document::Paragraph;
use crate::errors::ProviderError;
use crate::providers::{complete_with_timeout, ResolvedProvider, SharedClient};

use super::prompts;

/// A term found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTerm {
    /// Term in the form first returned by the model
    pub term: String,
    /// Case-insensitive occurrences in the document text
    pub count: usize,
}

/// Reply shape requested from the model
#[derive(Debug, Deserialize)]
struct TermsReply {
    terms: Vec<String>,
}

/// LLM-backed term extractor
#[derive(Debug, Clone)]
pub struct TermExtractor {
    client: SharedClient,
    request_timeout: Duration,
    max_concurrent_requests: usize,
}

impl TermExtractor {
    /// Create an extractor
    pub fn new(client: SharedClient, request_timeout: Duration, max_concurrent_requests: usize) -> Self {
        Self {
            client,
            request_timeout,
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Extract and count the terms of a document.
    ///
    /// Any failed call or non-JSON reply fails the whole extraction.
    pub async fn extract(
        &self,
        paragraphs: &[Paragraph],
        provider: &ResolvedProvider,
    ) -> Result<Vec<ExtractedTerm>, ProviderError> {
        info!(
            "Extracting terms from {} paragraphs with {}",
            paragraphs.len(),
            provider.name
        );

        // `buffered` keeps paragraph order so the first-seen form is deterministic.
        // Each future owns its inputs so the whole call stays `Send` for axum handlers.
        let replies: Vec<Vec<String>> = stream::iter(paragraphs.to_vec())
            .map(|paragraph| {
                let extractor = self.clone();
                let provider = provider.clone();
                async move { extractor.extract_paragraph(&paragraph, &provider).await }
            })
            .buffered(self.max_concurrent_requests)
            .try_collect()
            .await?;

        let full_text: String = paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<String>()
            .to_lowercase();

        Ok(merge_terms(replies.into_iter().flatten(), &full_text))
    }

    async fn extract_paragraph(
        &self,
        paragraph: &Paragraph,
        provider: &ResolvedProvider,
    ) -> Result<Vec<String>, ProviderError> {
        let request = prompts::extraction_request(&paragraph.text);
        let reply =
            complete_with_timeout(self.client.as_ref(), provider, &request, self.request_timeout)
                .await?;
        let parsed = parse_terms_reply(&reply)?;
        debug!("Paragraph {}: {} terms", paragraph.index, parsed.len());
        Ok(parsed)
    }
}

/// Parse a `{"terms": [...]}` reply
pub fn parse_terms_reply(reply: &str) -> Result<Vec<String>, ProviderError> {
    serde_json::from_str::<TermsReply>(reply.trim())
        .map(|r| r.terms)
        .map_err(|e| ProviderError::ParseError(format!("Model returned invalid JSON: {}", e)))
}

/// Merge terms case-insensitively in first-seen order and count them in `lowercase_text`
pub fn merge_terms<I>(terms: I, lowercase_text: &str) -> Vec<ExtractedTerm>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    terms
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(|term| {
            let count = lowercase_text.matches(term.to_lowercase().as_str()).count();
            ExtractedTerm { term, count }
        })
        .collect()
}
