/*!
 * Batch events and the sinks that receive them.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::SinkError;

use super::unit::TranslationUnit;

/// Event emitted while a batch runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchEvent {
    /// One paragraph finished, in completion order
    Progress {
        /// Number of paragraphs finished so far
        current: usize,
        /// Number of paragraphs in the batch
        total: usize,
        /// The unit that just finished
        result: TranslationUnit,
    },

    /// All paragraphs finished; `results[i]` belongs to paragraph `i`
    Done {
        /// Number of paragraphs in the batch
        total: usize,
        /// Units in paragraph order
        results: Vec<TranslationUnit>,
    },

    /// The batch could not be set up
    Error {
        /// Human-readable reason
        message: String,
    },
}

impl BatchEvent {
    /// Build an error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the event, as in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Receiver of batch events
///
/// An error means the event could not be delivered; the batch stops emitting.
#[async_trait]
pub trait EventSink: Send {
    /// Deliver one event
    async fn emit(&mut self, event: BatchEvent) -> Result<(), SinkError>;
}

#[async_trait]
impl EventSink for mpsc::Sender<BatchEvent> {
    async fn emit(&mut self, event: BatchEvent) -> Result<(), SinkError> {
        self.send(event).await.map_err(|_| SinkError::Disconnected)
    }
}

#[async_trait]
impl EventSink for mpsc::UnboundedSender<BatchEvent> {
    async fn emit(&mut self, event: BatchEvent) -> Result<(), SinkError> {
        self.send(event).map_err(|_| SinkError::Disconnected)
    }
}

/// Collects events in memory
#[async_trait]
impl EventSink for Vec<BatchEvent> {
    async fn emit(&mut self, event: BatchEvent) -> Result<(), SinkError> {
        self.push(event);
        Ok(())
    }
}
