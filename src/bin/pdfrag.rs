//! pdfrag CLI
//!
//! Command-line interface for chunking, ingesting, querying and deleting
//! PDFs without running the HTTP server. Every command prints JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use pdfrag_lib::documents::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use pdfrag_lib::documents::ingest::PDF_CONTENT_TYPE;
use pdfrag_lib::{
    chunk_text_with, extract_pdf, ingest_document, telemetry, validate_upload, Chunk, ChunkOptions, Services,
    Settings, UploadedFile,
};

#[derive(Parser)]
#[command(name = "pdfrag-cli")]
#[command(about = "pdfrag CLI - ingest PDFs and ask questions about them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and chunk a PDF locally without storing anything
    Chunk {
        /// Path to the PDF
        path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },
    /// Embed a PDF into the vector index
    Ingest {
        /// Path to the PDF
        path: PathBuf,
        #[command(flatten)]
        settings: Settings,
    },
    /// Ask a question about an ingested document
    Ask {
        /// Document ID returned by `ingest`
        document_id: String,
        question: String,
        #[command(flatten)]
        settings: Settings,
    },
    /// Remove an ingested document from the index
    Delete {
        document_id: String,
        #[command(flatten)]
        settings: Settings,
    },
}

// ============ Output Types ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkOutput {
    page_count: u32,
    chunk_count: usize,
    chunks: Vec<Chunk>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestOutput {
    id: String,
    name: String,
    page_count: u32,
    chunk_count: usize,
    uploaded_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOutput {
    document_id: String,
    /// Deletion is best-effort; failures only show up in the log
    requested: bool,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

// ============ Main ============

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chunk { path, chunk_size, overlap } => handle_chunk(&path, chunk_size, overlap).await,
        Commands::Ingest { path, settings } => handle_ingest(&path, &settings).await,
        Commands::Ask { document_id, question, settings } => handle_ask(&document_id, &question, &settings).await,
        Commands::Delete { document_id, settings } => handle_delete(&document_id, &settings).await,
    };

    match result {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let error = ErrorOutput { error: format!("{:#}", e) };
            println!("{}", serde_json::to_string(&error).unwrap_or_else(|_| "{\"error\":\"unknown\"}".to_string()));
            std::process::exit(1);
        }
    }
}

// ============ Handlers ============

async fn handle_chunk(path: &Path, chunk_size: usize, overlap: usize) -> Result<String> {
    let bytes = read_file(path)?;
    let extracted = extract_pdf(bytes).await?;
    let chunks = chunk_text_with(&extracted.text, ChunkOptions { chunk_size, overlap });

    let output = ChunkOutput {
        page_count: extracted.page_count,
        chunk_count: chunks.len(),
        chunks,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn handle_ingest(path: &Path, settings: &Settings) -> Result<String> {
    let file = UploadedFile {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string()),
        content_type: content_type_for(path),
        bytes: read_file(path)?,
    };
    validate_upload(Some(&file), settings.max_file_size)?;

    let services = Services::from_settings(settings);
    let document = ingest_document(&services.store, file).await?;

    let output = IngestOutput {
        id: document.id,
        name: document.name,
        page_count: document.page_count,
        chunk_count: document.chunk_count,
        uploaded_at: document.uploaded_at.to_rfc3339(),
    };
    Ok(serde_json::to_string(&output)?)
}

async fn handle_ask(document_id: &str, question: &str, settings: &Settings) -> Result<String> {
    let services = Services::from_settings(settings);
    let response = services.assistant.answer(document_id, question).await?;
    Ok(serde_json::to_string(&response)?)
}

async fn handle_delete(document_id: &str, settings: &Settings) -> Result<String> {
    let services = Services::from_settings(settings);
    services.store.delete_namespace(document_id).await;

    let output = DeleteOutput {
        document_id: document_id.to_string(),
        requested: true,
    };
    Ok(serde_json::to_string(&output)?)
}

// ============ Helpers ============

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn content_type_for(path: &Path) -> Option<String> {
    path.extension()
        .filter(|ext| ext.eq_ignore_ascii_case("pdf"))
        .map(|_| PDF_CONTENT_TYPE.to_string())
}
