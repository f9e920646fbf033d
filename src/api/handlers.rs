use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::errors::ApiError;
use crate::documents::{ingest_document, validate_upload, ChatResponse, IngestError, UploadedDocument, UploadedFile};
use crate::services::Services;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

// ============ Upload ============

pub async fn upload(
    State(services): State<Arc<Services>>,
    mut multipart: Multipart,
) -> Result<Json<UploadedDocument>, ApiError> {
    let limit = services.max_upload_bytes;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        file = Some(UploadedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    validate_upload(file.as_ref(), limit)?;
    let file = file.ok_or(IngestError::MissingFile)?;

    let document = ingest_document(&services.store, file).await?;
    info!(document_id = %document.id, chunks = document.chunk_count, "Document uploaded");
    Ok(Json(document))
}

fn multipart_error(e: MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return IngestError::TooLarge { size: limit + 1, limit }.into();
    }
    ApiError::bad_request("Invalid multipart body").with_details(e.body_text())
}

// ============ Chat ============

pub async fn chat(
    State(services): State<Arc<Services>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|rejection| ApiError::bad_request("Invalid request body").with_details(rejection.body_text()))?;

    let message = request.message.filter(|m| !m.is_empty());
    let document_id = request.document_id.filter(|d| !d.is_empty());
    let (Some(message), Some(document_id)) = (message, document_id) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let response = services.assistant.answer(&document_id, &message).await?;
    Ok(Json(response))
}

// ============ Documents ============

/// Best-effort: always 204, failures are only logged.
pub async fn delete_document(State(services): State<Arc<Services>>, Path(id): Path<String>) -> StatusCode {
    services.store.delete_namespace(&id).await;
    StatusCode::NO_CONTENT
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
