/*!
 * Per-paragraph translation results.
 */

use serde::{Deserialize, Serialize};

use crate::document::Paragraph;
use crate::errors::ProviderError;

use super::terms::MarkResult;

/// Prefix of the stage-1 error sentinel stored in `initial`
pub const ERROR_MARKER: &str = "[ERROR:";

/// Sentinel stored as `initial` when stage 1 fails
pub fn error_sentinel(error: &ProviderError) -> String {
    format!("{} translation failed - {}]", ERROR_MARKER, error.kind())
}

/// Whether a stage-1 text is an error sentinel
pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

/// Glossary entry as passed into a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Source-language term
    pub term: String,
    /// Preferred translation, informational only
    #[serde(default)]
    pub translation: String,
}

impl GlossaryEntry {
    /// Create an entry
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
        }
    }
}

/// Result of the initial translation stage
#[derive(Debug, Clone, PartialEq)]
pub enum InitialOutcome {
    /// The model produced a translation
    Translated(String),
    /// The call failed; nothing downstream runs
    Failed(ProviderError),
}

/// Result of the refinement stage
#[derive(Debug, Clone, PartialEq)]
pub enum RefineOutcome {
    /// Refinement was not requested
    Skipped,
    /// The model produced a refined translation
    Refined(String),
    /// Soft failure, the initial translation stands
    Failed(ProviderError),
}

/// Finished result for one paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Index of the source paragraph
    pub index: usize,

    /// Source paragraph text
    pub original: String,

    /// Stage-1 translation, or an error sentinel
    pub initial: String,

    /// Stage-2 translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,

    /// Source text with glossary terms marked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_text: Option<String>,

    /// Glossary terms found in the source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_terms: Option<Vec<String>>,

    /// Stage-1 failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stage-2 failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine_error: Option<String>,
}

impl TranslationUnit {
    /// Unit for a paragraph whose stage-1 call failed
    pub fn failed(paragraph: &Paragraph, error: &ProviderError) -> Self {
        Self {
            index: paragraph.index,
            original: paragraph.text.clone(),
            initial: error_sentinel(error),
            optimized: None,
            marked_text: None,
            found_terms: None,
            error: Some(error.to_string()),
            refine_error: None,
        }
    }

    /// Unit for a paragraph whose stage-1 call succeeded
    pub fn translated(
        paragraph: &Paragraph,
        initial: String,
        refine: RefineOutcome,
        marking: Option<MarkResult>,
    ) -> Self {
        let (optimized, refine_error) = match refine {
            RefineOutcome::Skipped => (None, None),
            RefineOutcome::Refined(text) => (Some(text), None),
            RefineOutcome::Failed(e) => (None, Some(e.to_string())),
        };
        let (marked_text, found_terms) = match marking {
            Some(result) => (Some(result.marked_text), Some(result.found_terms)),
            None => (None, None),
        };

        Self {
            index: paragraph.index,
            original: paragraph.text.clone(),
            initial,
            optimized,
            marked_text,
            found_terms,
            error: None,
            refine_error,
        }
    }

    /// Whether stage 1 failed for this unit
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Best available translation: refined, else initial
    pub fn best_translation(&self) -> &str {
        self.optimized.as_deref().unwrap_or(&self.initial)
    }
}
