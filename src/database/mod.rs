/*!
 * Database module for persistent storage of the glossary and translation history.
 *
 * This module provides SQLite-based persistence for:
 * - Glossary terms keyed by their lower-cased form
 * - An append-only log of saved translations
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
