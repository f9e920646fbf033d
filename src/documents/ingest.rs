//! Document Ingestion
//!
//! Validates an uploaded PDF, extracts and chunks its text, and stores the
//! chunk vectors under a fresh document id.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ulid::Ulid;

use super::chunker::chunk_text;
use super::pdf::{extract_pdf, PdfError};
use crate::vector::{VectorStore, VectorStoreError};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No file provided")]
    MissingFile,
    #[error("Only PDF files are allowed")]
    NotPdf,
    #[error("File size exceeds {}", size_label(.limit))]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("PDF appears to be empty or unreadable")]
    EmptyText,
    #[error("Failed to create text chunks from PDF")]
    NoChunks,
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

const MIB: usize = 1024 * 1024;

/// Whole mebibytes when exact, bytes otherwise.
fn size_label(bytes: &usize) -> String {
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

impl Serialize for IngestError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// A file received from a client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: String,
    pub name: String,
    /// `data:` URL of the original bytes for client-side rendering
    pub url: String,
    pub page_count: u32,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Reject uploads that are not PDFs or exceed the size limit.
pub fn validate_upload(file: Option<&UploadedFile>, max_bytes: usize) -> Result<(), IngestError> {
    let file = file.ok_or(IngestError::MissingFile)?;

    let is_pdf = file
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false);
    if !is_pdf {
        return Err(IngestError::NotPdf);
    }

    if file.bytes.len() > max_bytes {
        return Err(IngestError::TooLarge {
            size: file.bytes.len(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Extract, chunk, embed and store a PDF.
///
/// The caller is expected to have run [`validate_upload`].
pub async fn ingest_document(store: &VectorStore, file: UploadedFile) -> Result<UploadedDocument, IngestError> {
    let document_id = Ulid::new().to_string();
    let UploadedFile { name, bytes, .. } = file;
    info!(document_id = %document_id, name = %name, bytes = bytes.len(), "Ingesting document");

    let url = format!("data:{};base64,{}", PDF_CONTENT_TYPE, BASE64.encode(&bytes));
    let extracted = extract_pdf(bytes).await?;
    if extracted.text.trim().is_empty() {
        warn!(document_id = %document_id, "PDF has no extractable text");
        return Err(IngestError::EmptyText);
    }

    let chunks = chunk_text(&extracted.text);
    info!(document_id = %document_id, chunks = chunks.len(), pages = extracted.page_count, "Chunked document");
    if chunks.is_empty() {
        return Err(IngestError::NoChunks);
    }

    store.ensure_index_exists().await;
    store.upsert(&document_id, &chunks).await?;

    info!(document_id = %document_id, "Upload complete");
    Ok(UploadedDocument {
        id: document_id,
        name,
        url,
        page_count: extracted.page_count,
        chunk_count: chunks.len(),
        uploaded_at: Utc::now(),
    })
}
