/*!
 * Error types for the doctran application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not finish within the configured bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Short stable label for the failure class, used in the per-paragraph error marker
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestFailed(_) => "RequestFailed",
            Self::ParseError(_) => "ParseError",
            Self::ApiError { .. } => "ApiError",
            Self::ConnectionError(_) => "ConnectionError",
            Self::RateLimitExceeded(_) => "RateLimitExceeded",
            Self::AuthenticationError(_) => "AuthenticationError",
            Self::Timeout(_) => "Timeout",
        }
    }
}

/// Errors raised while turning an uploaded document into paragraphs
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The payload looked like a ZIP container but could not be opened
    #[error("Invalid document archive: {0}")]
    InvalidArchive(String),

    /// The archive has no main document part
    #[error("Document body not found: {0}")]
    MissingBody(String),

    /// The document XML could not be parsed
    #[error("Malformed document XML: {0}")]
    InvalidXml(String),

    /// A plain-text payload that is not valid UTF-8
    #[error("Document is neither DOCX nor UTF-8 text: {0}")]
    InvalidEncoding(String),

    /// No bytes were received
    #[error("Document is empty")]
    Empty,
}

/// Errors raised by an event sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The receiving side went away
    #[error("Event sink disconnected")]
    Disconnected,

    /// The event could not be encoded for the wire
    #[error("Failed to encode event: {0}")]
    Encode(String),
}

/// Errors from the glossary and history stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// A glossary term with the same key is already stored
    #[error("Term already exists: {0}")]
    AlreadyExists(String),

    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.into())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document extraction
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from the persistent stores
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
