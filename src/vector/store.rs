//! Document Vector Store
//!
//! Embeds chunks and writes them into a per-document namespace, searches a
//! namespace with an embedded question, and keeps the index provisioned.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{IndexSpec, RecordMetadata, RetrievalResult, VectorIndex, VectorRecord, VectorStoreError};
use crate::documents::chunker::Chunk;
use crate::documents::embeddings::EmbeddingClient;

/// Wait after creating an index before it accepts writes
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 60;

/// Chunks embedded concurrently per round
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 10;

/// Pause between embedding rounds
pub const DEFAULT_EMBED_PAUSE_MS: u64 = 500;

/// Records per upsert request
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub index: IndexSpec,
    pub settle_delay: Duration,
    pub embed_batch_size: usize,
    pub embed_pause: Duration,
    pub upsert_batch_size: usize,
}

impl StoreSettings {
    pub fn new(index: IndexSpec) -> Self {
        Self {
            index,
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            embed_pause: Duration::from_millis(DEFAULT_EMBED_PAUSE_MS),
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }
}

/// Deterministic id of a chunk vector
pub fn vector_id(document_id: &str, chunk_index: u32) -> String {
    format!("{}_chunk_{}", document_id, chunk_index)
}

/// Namespace-scoped store over a vector index. Cheap to clone.
#[derive(Clone)]
pub struct VectorStore {
    index: Arc<dyn VectorIndex>,
    embedder: EmbeddingClient,
    settings: Arc<StoreSettings>,
}

impl VectorStore {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: EmbeddingClient, settings: StoreSettings) -> Self {
        Self {
            index,
            embedder,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Create the configured index if it is missing, then wait for it to settle.
    ///
    /// Failures are logged, never returned: a later write reports the real
    /// problem if the index is unusable.
    pub async fn ensure_index_exists(&self) {
        let spec = &self.settings.index;
        match self.index.list_indexes().await {
            Ok(names) if names.iter().any(|n| n == &spec.name) => {
                debug!(index = %spec.name, "Index already exists");
            }
            Ok(_) => {
                info!(index = %spec.name, dimension = spec.dimension, "Creating index");
                match self.index.create_index(spec).await {
                    Ok(()) => {
                        info!(
                            index = %spec.name,
                            wait_secs = self.settings.settle_delay.as_secs(),
                            "Waiting for index to initialize"
                        );
                        tokio::time::sleep(self.settings.settle_delay).await;
                    }
                    Err(e) => error!(index = %spec.name, error = %e, "Failed to create index"),
                }
            }
            Err(e) => error!(index = %spec.name, error = %e, "Failed to list indexes"),
        }
    }

    /// Embed and write every chunk of a document into its namespace.
    ///
    /// Chunks are embedded in concurrent rounds with a pause in between,
    /// then written in batches. The first error aborts the rest.
    pub async fn upsert(&self, document_id: &str, chunks: &[Chunk]) -> Result<usize, VectorStoreError> {
        let round_size = self.settings.embed_batch_size.max(1);
        let mut records = Vec::with_capacity(chunks.len());

        for (round, batch) in chunks.chunks(round_size).enumerate() {
            if round > 0 {
                tokio::time::sleep(self.settings.embed_pause).await;
            }

            let embeddings = try_join_all(batch.iter().map(|chunk| self.embedder.embed(&chunk.text))).await?;

            for (chunk, values) in batch.iter().zip(embeddings) {
                records.push(VectorRecord {
                    id: vector_id(document_id, chunk.chunk_index),
                    values,
                    metadata: RecordMetadata {
                        document_id: document_id.to_string(),
                        text: chunk.text.clone(),
                        page_number: chunk.page_number,
                        chunk_index: chunk.chunk_index,
                    },
                });
            }
            debug!(document_id = %document_id, embedded = records.len(), total = chunks.len(), "Embedding round complete");
        }

        let mut written = 0;
        for batch in records.chunks(self.settings.upsert_batch_size.max(1)) {
            written += self.index.upsert(document_id, batch).await?;
        }

        info!(document_id = %document_id, count = written, "Stored document vectors");
        Ok(written)
    }

    /// Nearest chunks of one document, best first.
    pub async fn query(
        &self,
        document_id: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, VectorStoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query_text).await?;
        let matches = self.index.query(document_id, &vector, top_k).await?;

        let mut results: Vec<RetrievalResult> = matches
            .into_iter()
            .filter_map(|m| {
                let metadata = m.metadata?;
                Some(RetrievalResult {
                    text: metadata.text,
                    page_number: metadata.page_number,
                    score: m.score,
                })
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        debug!(document_id = %document_id, hits = results.len(), "Namespace search complete");
        Ok(results)
    }

    /// Remove every vector of a document. Failures are logged only.
    pub async fn delete_namespace(&self, document_id: &str) {
        match self.index.delete_all(document_id).await {
            Ok(()) => info!(document_id = %document_id, "Deleted document vectors"),
            Err(e) => error!(document_id = %document_id, error = %e, "Failed to delete document vectors"),
        }
    }
}
