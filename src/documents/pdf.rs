//! PDF Text Extraction
//!
//! Runs `pdf-extract` on the blocking pool and joins per-page text with
//! blank lines.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
}

impl Serialize for PdfError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Text content of a parsed PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPdf {
    pub text: String,
    pub page_count: u32,
}

/// Extract the text of every page.
///
/// Corrupt, encrypted, and page-less documents are all `PdfError::Parse`.
/// The parser is synchronous and may panic on hostile input, so it runs on
/// the blocking pool where a panic surfaces as a join error.
pub async fn extract_pdf(bytes: Vec<u8>) -> Result<ExtractedPdf, PdfError> {
    let size = bytes.len();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await
        .map_err(|e| {
            warn!(error = %e, "PDF extraction task failed");
            PdfError::Parse(format!("extraction task failed: {}", e))
        })?
        .map_err(|e| PdfError::Parse(e.to_string()))?;

    if pages.is_empty() {
        return Err(PdfError::Parse("document has no pages".to_string()));
    }

    let page_count = pages.len() as u32;
    let text = pages
        .iter()
        .map(|page| page.trim())
        .collect::<Vec<_>>()
        .join("\n\n");

    debug!(bytes = size, pages = page_count, chars = text.len(), "PDF extracted");
    Ok(ExtractedPdf { text, page_count })
}
