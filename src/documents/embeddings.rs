//! Remote Embeddings
//!
//! Turns text into fixed-size vectors through a hosted feature-extraction
//! model. Provider responses come in several shapes and are normalised to a
//! single vector; transient failures are retried with exponential backoff.

use std::sync::Arc;
use tracing::debug;

use crate::inference::{EmbeddingError, FeatureExtractionResponse, FeatureExtractor};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Embedding vector
pub type Embedding = Vec<f32>;

/// Shared handle to a feature-extraction provider. Cheap to clone.
#[derive(Clone)]
pub struct EmbeddingClient {
    extractor: Arc<dyn FeatureExtractor>,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(extractor: Arc<dyn FeatureExtractor>) -> Self {
        Self {
            extractor,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Embed a single text.
    ///
    /// Quota exhaustion fails immediately. Any other failure is retried
    /// until the policy runs out, then the last error is returned.
    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let extractor = &self.extractor;
        let embedding = retry_with_backoff(&self.retry, EmbeddingError::is_retryable, move || async move {
            let response = extractor.feature_extraction(text).await?;
            normalize_embedding(response)
        })
        .await?;

        debug!(dimension = embedding.len(), "Embedding generated");
        Ok(embedding)
    }
}

/// Collapse a provider response into one vector.
pub fn normalize_embedding(response: FeatureExtractionResponse) -> Result<Embedding, EmbeddingError> {
    match response {
        FeatureExtractionResponse::Flat(values) if !values.is_empty() => Ok(values),
        FeatureExtractionResponse::Flat(_) => {
            Err(EmbeddingError::UnexpectedFormat("empty embedding".to_string()))
        }
        FeatureExtractionResponse::Nested(rows) => rows
            .into_iter()
            .next()
            .filter(|first| !first.is_empty())
            .ok_or_else(|| EmbeddingError::UnexpectedFormat("empty nested embedding".to_string())),
        FeatureExtractionResponse::Failure { error } => {
            Err(EmbeddingError::UnexpectedFormat(format!("provider error: {}", error)))
        }
    }
}

/// Calculate cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
