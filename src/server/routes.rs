/*!
 * JSON endpoints.
 */

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::models::{GlossaryPage, NewTranslation, PageRequest, TranslationRecord};
use crate::document::extract_paragraphs;
use crate::translation::{ExtractedTerm, TextTranslation, TextTranslationRequest};

use super::{ApiError, AppState};

/// Body of `POST /api/translation`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveTranslationRequest {
    /// Source text
    #[serde(default)]
    pub text: String,
    /// Translated text
    #[serde(default)]
    pub translation: String,
    /// Source language label
    #[serde(default)]
    pub lang: String,
    /// Target language label
    #[serde(default, rename = "targetLang", alias = "target_lang")]
    pub target_lang: String,
}

/// Body of the glossary add/update endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct GlossaryTermIn {
    /// Term, matched case-insensitively
    pub term: String,
    /// Preferred translation
    pub translation: String,
}

/// Body of the glossary delete endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteGlossaryTermIn {
    /// Term, matched case-insensitively
    pub term: String,
}

/// History listing
#[derive(Debug, Clone, Serialize)]
pub struct TranslationHistory {
    /// Rows, newest first
    pub translations: Vec<TranslationRecord>,
}

/// Term extraction result
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedTerms {
    /// Terms with their document counts
    pub terms: Vec<ExtractedTerm>,
}

fn success() -> Json<Value> {
    Json(json!({ "status": "success" }))
}

/// POST /api/translate
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TextTranslationRequest>,
) -> Result<Json<TextTranslation>, ApiError> {
    let result = state.service.translate_text(&request).await?;
    Ok(Json(result))
}

/// POST /api/translation
pub async fn save_translation(
    State(state): State<AppState>,
    Json(request): Json<SaveTranslationRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = state
        .repository
        .save_translation(NewTranslation {
            original_text: request.text,
            translated_text: request.translation,
            target_language: request.target_lang,
        })
        .await?;
    info!("Saved translation {}", id);
    Ok(success())
}

/// GET /api/translation/history
pub async fn translation_history(
    State(state): State<AppState>,
) -> Result<Json<TranslationHistory>, ApiError> {
    let translations = state.repository.list_translations().await?;
    Ok(Json(TranslationHistory { translations }))
}

/// DELETE /api/translation/{id}
pub async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repository.delete_translation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/glossary/all
pub async fn list_glossary(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<GlossaryPage>, ApiError> {
    if page.page == 0 || page.per_page == 0 || page.per_page > crate::database::models::MAX_PAGE_SIZE
    {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "page must be >= 1 and per_page between 1 and 200",
        ));
    }
    Ok(Json(state.repository.list_glossary(page).await?))
}

/// POST /api/glossary/add
pub async fn add_glossary_term(
    State(state): State<AppState>,
    Json(term): Json<GlossaryTermIn>,
) -> Result<Json<Value>, ApiError> {
    state
        .repository
        .add_glossary_term(&term.term, &term.translation)
        .await?;
    Ok(success())
}

/// POST /api/glossary/update
pub async fn update_glossary_term(
    State(state): State<AppState>,
    Json(term): Json<GlossaryTermIn>,
) -> Result<Json<Value>, ApiError> {
    state
        .repository
        .update_glossary_term(&term.term, &term.translation)
        .await?;
    Ok(success())
}

/// POST /api/glossary/delete
pub async fn delete_glossary_term(
    State(state): State<AppState>,
    Json(term): Json<DeleteGlossaryTermIn>,
) -> Result<Json<Value>, ApiError> {
    state.repository.delete_glossary_term(&term.term).await?;
    Ok(success())
}

/// POST /api/term_extract/term_extract_batch
///
/// Multipart form with a `file` part and an `extraction_provider` field.
pub async fn extract_terms(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedTerms>, ApiError> {
    let mut document: Option<Vec<u8>> = None;
    let mut provider: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart form: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                document = Some(bytes.to_vec());
            }
            "extraction_provider" => {
                provider = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read extraction_provider: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let document = document.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    let provider =
        provider.ok_or_else(|| ApiError::bad_request("Missing 'extraction_provider' field"))?;

    let paragraphs = extract_paragraphs(&document)?;
    let terms = state.service.extract_terms(&paragraphs, &provider).await?;
    Ok(Json(ExtractedTerms { terms }))
}
