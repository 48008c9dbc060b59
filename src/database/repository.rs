/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for the glossary and the translation
 * history, abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::StoreError;
use crate::translation::GlossaryEntry;

use super::connection::DatabaseConnection;
use super::models::{GlossaryPage, GlossaryTerm, NewTranslation, PageRequest, TranslationRecord};

/// Current time in the stored timestamp format
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_glossary_row(row: &rusqlite::Row) -> rusqlite::Result<GlossaryTerm> {
    Ok(GlossaryTerm {
        term: row.get(0)?,
        translation: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

fn parse_translation_row(row: &rusqlite::Row) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        original_text: row.get(1)?,
        translated_text: row.get(2)?,
        target_language: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    // =========================================================================
    // Glossary Operations
    // =========================================================================

    /// List one page of the glossary, most recently updated first
    pub async fn list_glossary(&self, page: PageRequest) -> Result<GlossaryPage, StoreError> {
        let page = page.normalized();

        self.db
            .execute_async(move |conn| {
                let total: i64 =
                    conn.query_row("SELECT COUNT(*) FROM glossary", [], |row| row.get(0))?;
                let total = total.max(0) as u64;

                let mut stmt = conn.prepare(
                    r#"
                    SELECT term, translation, updated_at FROM glossary
                    ORDER BY updated_at DESC, rowid DESC
                    LIMIT ?1 OFFSET ?2
                    "#,
                )?;
                let terms = stmt
                    .query_map(
                        params![i64::from(page.per_page), page.offset() as i64],
                        parse_glossary_row,
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(GlossaryPage {
                    terms,
                    total,
                    page: page.page,
                    per_page: page.per_page,
                    total_pages: page.total_pages(total),
                })
            })
            .await
    }

    /// Add a term; the key is the lower-cased term
    pub async fn add_glossary_term(
        &self,
        term: &str,
        translation: &str,
    ) -> Result<GlossaryTerm, StoreError> {
        let row = GlossaryTerm {
            term: term.trim().to_lowercase(),
            translation: translation.to_string(),
            updated_at: now_timestamp(),
        };

        self.db
            .execute_async(move |conn| {
                if Self::find_term(conn, &row.term)?.is_some() {
                    return Err(StoreError::AlreadyExists(row.term));
                }
                conn.execute(
                    "INSERT INTO glossary (term, translation, updated_at) VALUES (?1, ?2, ?3)",
                    params![row.term, row.translation, row.updated_at],
                )?;
                debug!("Added glossary term '{}'", row.term);
                Ok(row)
            })
            .await
    }

    /// Replace the translation of an existing term
    pub async fn update_glossary_term(
        &self,
        term: &str,
        translation: &str,
    ) -> Result<GlossaryTerm, StoreError> {
        let row = GlossaryTerm {
            term: term.trim().to_lowercase(),
            translation: translation.to_string(),
            updated_at: now_timestamp(),
        };

        self.db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    "UPDATE glossary SET translation = ?1, updated_at = ?2 WHERE term = ?3",
                    params![row.translation, row.updated_at, row.term],
                )?;
                if changed == 0 {
                    return Err(StoreError::NotFound(format!("term '{}'", row.term)));
                }
                Ok(row)
            })
            .await
    }

    /// Delete a term, matching case-insensitively
    pub async fn delete_glossary_term(&self, term: &str) -> Result<(), StoreError> {
        let key = term.trim().to_lowercase();

        self.db
            .execute_async(move |conn| {
                let changed = conn.execute("DELETE FROM glossary WHERE term = ?1", params![key])?;
                if changed == 0 {
                    return Err(StoreError::NotFound(format!("term '{}'", key)));
                }
                Ok(())
            })
            .await
    }

    /// Every glossary entry, for marking a batch
    pub async fn glossary_snapshot(&self) -> Result<Vec<GlossaryEntry>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT term, translation, updated_at FROM glossary ORDER BY term",
                )?;
                let rows = stmt
                    .query_map([], parse_glossary_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows.into_iter().map(GlossaryEntry::from).collect())
            })
            .await
    }

    fn find_term(conn: &Connection, term: &str) -> Result<Option<GlossaryTerm>, StoreError> {
        Ok(conn
            .query_row(
                "SELECT term, translation, updated_at FROM glossary WHERE term = ?1",
                params![term],
                parse_glossary_row,
            )
            .optional()?)
    }

    // =========================================================================
    // Translation History Operations
    // =========================================================================

    /// Append a translation, returning its id
    pub async fn save_translation(&self, record: NewTranslation) -> Result<i64, StoreError> {
        let timestamp = now_timestamp();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translations (original_text, translated_text, target_language, timestamp)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        record.original_text,
                        record.translated_text,
                        record.target_language,
                        timestamp,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// All history rows, newest first
    pub async fn list_translations(&self) -> Result<Vec<TranslationRecord>, StoreError> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, original_text, translated_text, target_language, timestamp
                    FROM translations
                    ORDER BY timestamp DESC, id DESC
                    "#,
                )?;
                let rows = stmt
                    .query_map([], parse_translation_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
    }

    /// Delete one history row
    pub async fn delete_translation(&self, id: i64) -> Result<(), StoreError> {
        self.db
            .execute_async(move |conn| {
                let changed = conn.execute("DELETE FROM translations WHERE id = ?1", params![id])?;
                if changed == 0 {
                    return Err(StoreError::NotFound(format!("translation {}", id)));
                }
                Ok(())
            })
            .await
    }
}
