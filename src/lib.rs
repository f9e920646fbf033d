// pdfrag Library
// Exports the ingestion and question-answering pipeline for the server and CLI binaries

pub mod api;
pub mod config;
pub mod documents;
pub mod inference;
pub mod retry;
pub mod services;
pub mod telemetry;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Settings;
pub use documents::{
    chunk_text, chunk_text_with, extract_pdf, ingest_document, validate_upload, Assistant, AssistantError,
    ChatResponse, Chunk, ChunkOptions, Citation, EmbeddingClient, IngestError, UploadedDocument, UploadedFile,
};
pub use inference::{EmbeddingError, GenerationError, GenerationOptions, HuggingFaceClient};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use services::Services;
pub use vector::{MemoryIndex, PineconeClient, RetrievalResult, VectorIndex, VectorStore, VectorStoreError};
