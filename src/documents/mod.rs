//! PDF Document Pipeline
//!
//! Handles extraction, chunking, embedding, ingestion and question
//! answering for uploaded PDFs.

pub mod assistant;
pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod pdf;

// Re-export key public types
pub use assistant::{Assistant, AssistantError, ChatResponse, Citation};
pub use chunker::{chunk_text, chunk_text_with, Chunk, ChunkOptions};
pub use embeddings::{Embedding, EmbeddingClient};
pub use ingest::{ingest_document, validate_upload, IngestError, UploadedDocument, UploadedFile};
pub use pdf::{extract_pdf, ExtractedPdf, PdfError};
