//! Vector Index Gateway
//!
//! Namespace-per-document vector storage. The `VectorIndex` trait is the
//! seam over the hosted index; `VectorStore` layers embedding, batching and
//! index provisioning on top of it.

pub mod client;
pub mod memory;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::inference::EmbeddingError;

pub use client::PineconeClient;
pub use memory::MemoryIndex;
pub use store::{vector_id, StoreSettings, VectorStore};

/// Output size of the sentence-transformer embedding model
pub const EMBEDDING_DIMENSION: usize = 384;

pub const DEFAULT_METRIC: &str = "cosine";
pub const DEFAULT_CLOUD: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Pinecone HTTP error ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("Pinecone request failed: {0}")]
    Request(String),
    #[error("Pinecone index not found: {0}")]
    IndexNotFound(String),
    #[error("Pinecone index not ready: {0}")]
    IndexNotReady(String),
    #[error("Pinecone rejected the API key")]
    Unauthorized,
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

impl Serialize for VectorStoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for VectorStoreError {
    fn from(e: reqwest::Error) -> Self {
        VectorStoreError::Request(e.to_string())
    }
}

/// Metadata stored alongside every chunk vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub document_id: String,
    pub text: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub page_number: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub chunk_index: u32,
}

/// A vector with its id and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A single similarity-search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

/// Parameters for creating a serverless index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dimension: EMBEDDING_DIMENSION,
            metric: DEFAULT_METRIC.to_string(),
            cloud: DEFAULT_CLOUD.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Chunk returned by a namespace search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub text: String,
    pub page_number: u32,
    pub score: f32,
}

/// Hosted vector index operations, scoped by namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Names of the indexes visible to the account.
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError>;

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError>;

    /// Insert or overwrite records by id. Returns the number written.
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, VectorStoreError>;

    /// Up to `top_k` nearest records in the namespace.
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, VectorStoreError>;

    async fn delete_all(&self, namespace: &str) -> Result<(), VectorStoreError>;
}

/// Metadata numbers round-trip through the index as JSON floats.
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value
        .as_f64()
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a non-negative number, got {}", value)))
}
