/*!
 * Glossary term marking.
 *
 * Occurrences of glossary terms in a paragraph are wrapped in a
 * `[[[TERM_START|...]]]` envelope so a renderer can highlight them while
 * keeping the original casing. Longer terms are matched first so that a
 * term contained in a longer one never splits the longer match.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Opening delimiter of a marked term
pub const MARKER_OPEN: &str = "[[[TERM_START|";

/// Closing delimiter of a marked term
pub const MARKER_CLOSE: &str = "]]]";

static ENVELOPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\[\[TERM_START\|(.*?)\]\]\]").unwrap());

/// Output of a marking pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkResult {
    /// Text with every found term wrapped in an envelope
    pub marked_text: String,
    /// Lower-cased terms that matched at least once, longest first
    pub found_terms: Vec<String>,
}

/// Wrap one matched substring in the marker envelope
pub fn envelope(original: &str) -> String {
    format!("{}{}{}", MARKER_OPEN, original, MARKER_CLOSE)
}

/// Mark all whole-word, case-insensitive occurrences of `terms` in `text`.
///
/// Not idempotent: calling it again on its own output may mark inside
/// existing envelopes of shorter terms.
pub fn mark<S: AsRef<str>>(text: &str, terms: &[S]) -> MarkResult {
    if text.is_empty() || terms.is_empty() {
        return MarkResult {
            marked_text: text.to_string(),
            found_terms: Vec::new(),
        };
    }

    let mut marked_text = text.to_string();
    let mut found_terms = Vec::new();

    for term in normalized_terms(terms) {
        let pattern = match word_pattern(&term) {
            Some(pattern) => pattern,
            None => continue,
        };

        // Envelopes inserted for longer terms in this call are off limits
        let protected: Vec<Range<usize>> = ENVELOPE_REGEX
            .find_iter(&marked_text)
            .map(|m| m.range())
            .collect();

        let matches: Vec<Range<usize>> = pattern
            .find_iter(&marked_text)
            .map(|m| m.range())
            .filter(|m| !protected.iter().any(|p| m.start < p.end && p.start < m.end))
            .collect();

        if matches.is_empty() {
            continue;
        }
        found_terms.push(term);

        // Rightmost first so earlier offsets stay valid
        for range in matches.into_iter().rev() {
            let wrapped = envelope(&marked_text[range.clone()]);
            marked_text.replace_range(range, &wrapped);
        }
    }

    MarkResult {
        marked_text,
        found_terms,
    }
}

/// Strip every marker envelope, restoring the plain text
pub fn unmark(marked_text: &str) -> String {
    ENVELOPE_REGEX.replace_all(marked_text, "$1").into_owned()
}

/// Lower-case, drop blanks and duplicates, longest first.
/// The sort is stable, so equal-length terms keep their input order.
fn normalized_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .filter(|t| !t.trim().is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect();
    normalized.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    normalized
}

fn word_pattern(term: &str) -> Option<Regex> {
    match RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            warn!("Skipping glossary term '{}': {}", term, e);
            None
        }
    }
}
