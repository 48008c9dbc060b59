/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};

use crate::translation::GlossaryEntry;

/// Largest page size accepted by the glossary listing
pub const MAX_PAGE_SIZE: u32 = 200;

/// Glossary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    /// Lower-cased term, the primary key
    pub term: String,
    /// Preferred translation
    pub translation: String,
    /// RFC 3339 time of the last write
    pub updated_at: String,
}

impl From<GlossaryTerm> for GlossaryEntry {
    fn from(row: GlossaryTerm) -> Self {
        GlossaryEntry {
            term: row.term,
            translation: row.translation,
        }
    }
}

/// One page of the glossary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryPage {
    /// Rows on this page, most recently updated first
    pub terms: Vec<GlossaryTerm>,
    /// Total rows in the glossary
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Number of pages
    pub total_pages: u64,
}

/// Paging request for the glossary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size, at most `MAX_PAGE_SIZE`
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Clamp to a valid page and page size
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Number of pages needed for `total` rows
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page.max(1)))
    }
}

/// Translation history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Auto-increment id
    pub id: i64,
    /// Source text
    pub original_text: String,
    /// Translated text
    pub translated_text: String,
    /// Target language label
    pub target_language: String,
    /// RFC 3339 time of the write
    pub timestamp: String,
}

/// Translation to append to the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTranslation {
    /// Source text
    pub original_text: String,
    /// Translated text
    pub translated_text: String,
    /// Target language label
    pub target_language: String,
}
