//! Test doubles shared by the unit test modules.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::documents::embeddings::{Embedding, EmbeddingClient};
use crate::inference::{
    EmbeddingError, FeatureExtractionResponse, FeatureExtractor, GenerationError, GenerationOptions, TextGenerator,
};
use crate::vector::{
    IndexSpec, MemoryIndex, QueryMatch, StoreSettings, VectorIndex, VectorRecord, VectorStore, VectorStoreError,
    EMBEDDING_DIMENSION,
};

/// Deterministic bag-of-words embedder using feature hashing.
pub struct HashingExtractor;

fn hash_token(token: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % EMBEDDING_DIMENSION
}

pub fn hashing_embedding(text: &str) -> Embedding {
    let mut tf = vec![0.0f32; EMBEDDING_DIMENSION];
    for token in text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
    {
        tf[hash_token(&token.to_lowercase())] += 1.0;
    }

    let norm: f32 = tf.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut tf {
            *x /= norm;
        }
    } else {
        // Keep the vector non-zero so cosine scores stay defined
        tf[0] = 1.0;
    }
    tf
}

#[async_trait]
impl FeatureExtractor for HashingExtractor {
    async fn feature_extraction(&self, text: &str) -> Result<FeatureExtractionResponse, EmbeddingError> {
        Ok(FeatureExtractionResponse::Flat(hashing_embedding(text)))
    }
}

pub fn hashing_embedder() -> EmbeddingClient {
    EmbeddingClient::new(Arc::new(HashingExtractor))
}

/// Vector store over an in-memory index with hashing embeddings
pub fn memory_store(index: Arc<MemoryIndex>) -> VectorStore {
    VectorStore::new(index, hashing_embedder(), StoreSettings::new(IndexSpec::new("pdf-chat")))
}

/// Replays a fixed sequence of provider outcomes.
pub struct ScriptedExtractor {
    script: Mutex<VecDeque<Result<FeatureExtractionResponse, EmbeddingError>>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(script: Vec<Result<FeatureExtractionResponse, EmbeddingError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureExtractor for ScriptedExtractor {
    async fn feature_extraction(&self, _text: &str) -> Result<FeatureExtractionResponse, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(EmbeddingError::UnexpectedFormat("script exhausted".into())))
    }
}

/// Generator with a canned reply or a one-shot failure.
pub struct FakeGenerator {
    reply: String,
    failure: Mutex<Option<GenerationError>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failure: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            reply: String::new(),
            failure: Mutex::new(Some(error)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        match self.failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(self.reply.clone()),
        }
    }
}

/// Memory index whose list, create or delete calls can be made to fail.
pub struct FailingIndex {
    inner: Arc<MemoryIndex>,
    fail_list: bool,
    fail_create: bool,
    fail_delete: bool,
}

impl FailingIndex {
    pub fn new(inner: Arc<MemoryIndex>) -> Self {
        Self {
            inner,
            fail_list: false,
            fail_create: false,
            fail_delete: false,
        }
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }
}

fn outage() -> VectorStoreError {
    VectorStoreError::Http {
        status: 500,
        body: "index unavailable".into(),
    }
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        if self.fail_list {
            return Err(outage());
        }
        self.inner.list_indexes().await
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        if self.fail_create {
            return Err(outage());
        }
        self.inner.create_index(spec).await
    }

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, VectorStoreError> {
        self.inner.upsert(namespace, records).await
    }

    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.inner.query(namespace, vector, top_k).await
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), VectorStoreError> {
        if self.fail_delete {
            return Err(outage());
        }
        self.inner.delete_all(namespace).await
    }
}

/// Minimal one-page PDF showing `text` in Helvetica.
pub fn single_page_pdf(text: &str) -> Vec<u8> {
    let escaped = text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_start = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.extend_from_slice(xref.as_bytes());
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    pdf
}
