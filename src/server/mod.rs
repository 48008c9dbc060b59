/*!
 * HTTP and WebSocket surface.
 *
 * - `ws`: document translation sessions streamed over a WebSocket
 * - `routes`: JSON endpoints for single-text translation, history,
 *   glossary management and term extraction
 */

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::app_config::ServerConfig;
use crate::database::Repository;
use crate::errors::{DocumentError, ProviderError, StoreError};
use crate::translation::TranslationService;

pub mod routes;
pub mod ws;

/// Largest document accepted by the upload endpoints
pub const MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

/// State shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// Translation entry point
    pub service: TranslationService,
    /// Glossary and history store
    pub repository: Repository,
}

impl AppState {
    /// Create the shared state
    pub fn new(service: TranslationService, repository: Repository) -> Self {
        Self {
            service,
            repository,
        }
    }
}

/// Error returned by JSON handlers as `{ "detail": message }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Error with an explicit status
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 400
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            StoreError::Database(_) => {
                error!("Store failure: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        error!("Provider failure: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        Self::bad_request(e.to_string())
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/doc_translate/ws/translate", get(ws::translate_socket))
        .route("/api/translate", post(routes::translate))
        .route("/api/translation", post(routes::save_translation))
        .route("/api/translation/history", get(routes::translation_history))
        .route("/api/translation/{id}", delete(routes::delete_translation))
        .route("/api/glossary/all", get(routes::list_glossary))
        .route("/api/glossary/add", post(routes::add_glossary_term))
        .route("/api/glossary/update", post(routes::update_glossary_term))
        .route("/api/glossary/delete", post(routes::delete_glossary_term))
        .route(
            "/api/term_extract/term_extract_batch",
            post(routes::extract_terms),
        )
        .layer(axum::extract::DefaultBodyLimit::max(MAX_DOCUMENT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Listening on http://{}", address);
    axum::serve(listener, router(state))
        .await
        .context("Server terminated unexpectedly")
}
