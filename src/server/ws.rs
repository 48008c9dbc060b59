/*!
 * WebSocket document translation sessions.
 *
 * A session receives a JSON configuration frame and then the document as a
 * binary frame, and answers with progress events followed by one done event.
 * Setup failures produce a single error event.
 */

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::document::{extract_paragraphs, Paragraph};
use crate::errors::SinkError;
use crate::translation::{BatchEvent, BatchRequest, EventSink};

use super::{AppState, MAX_DOCUMENT_BYTES};

/// Event sink writing JSON text frames to a socket
pub struct WebSocketSink {
    sender: SplitSink<WebSocket, Message>,
}

impl WebSocketSink {
    /// Wrap the sending half of a socket
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }

    /// Close the socket politely
    pub async fn close(mut self) {
        let _ = self
            .sender
            .send(Message::Close(Some(CloseFrame {
                code: axum::extract::ws::close_code::NORMAL,
                reason: "".into(),
            })))
            .await;
    }
}

#[async_trait]
impl EventSink for WebSocketSink {
    async fn emit(&mut self, event: BatchEvent) -> Result<(), SinkError> {
        let json = serde_json::to_string(&event).map_err(|e| {
            error!("Failed to encode {} event: {}", event.kind(), e);
            SinkError::Encode(e.to_string())
        })?;
        self.sender
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| SinkError::Disconnected)
    }
}

/// WebSocket upgrade handler
///
/// GET /api/doc_translate/ws/translate
pub async fn translate_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_DOCUMENT_BYTES)
        .on_upgrade(move |socket| handle_session(socket, state))
}

/// Next data frame, skipping control frames. `None` when the peer is gone.
async fn next_data_frame(receiver: &mut SplitStream<WebSocket>) -> Option<Message> {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(message) => return Some(message),
        }
    }
    None
}

/// Read the two setup frames
async fn read_setup(
    receiver: &mut SplitStream<WebSocket>,
) -> Result<(BatchRequest, Vec<Paragraph>), String> {
    let request = match next_data_frame(receiver).await {
        Some(Message::Text(text)) => serde_json::from_str::<BatchRequest>(text.as_str())
            .map_err(|e| format!("Invalid configuration: {}", e))?,
        Some(_) => return Err("Expected a JSON configuration text frame".to_string()),
        None => return Err("Connection closed before configuration".to_string()),
    };

    let paragraphs = match next_data_frame(receiver).await {
        Some(Message::Binary(bytes)) => {
            extract_paragraphs(&bytes).map_err(|e| format!("Invalid document: {}", e))?
        }
        Some(_) => return Err("Expected the document as a binary frame".to_string()),
        None => return Err("Connection closed before document".to_string()),
    };

    Ok((request, paragraphs))
}

async fn handle_session(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    let (sender, mut receiver) = socket.split();
    let mut sink = WebSocketSink::new(sender);
    info!("[{}] Translation session opened", session_id);

    let (request, paragraphs) = match read_setup(&mut receiver).await {
        Ok(setup) => setup,
        Err(message) => {
            warn!("[{}] Session setup failed: {}", session_id, message);
            let _ = sink.emit(BatchEvent::error(message)).await;
            sink.close().await;
            return;
        }
    };

    // Cancel the batch as soon as the client goes away
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            while next_data_frame(&mut receiver).await.is_some() {
                debug!("[{}] Ignoring frame received mid-batch", session_id);
            }
            cancel.cancel();
        }
    });

    let outcome = state
        .service
        .run_batch(paragraphs, &request, &mut sink, &cancel)
        .await;
    info!("[{}] Session finished: {:?}", session_id, outcome);

    watcher.abort();
    sink.close().await;
}
