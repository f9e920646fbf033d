//! Hosted Inference Providers
//!
//! Narrow seams over the feature-extraction and text-generation services,
//! plus the Hugging Face HTTP client that implements both.

pub mod client;
pub mod types;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::retry::RetriesExhausted;

pub use client::HuggingFaceClient;
pub use types::{ChatCompletionResponse, FeatureExtractionResponse};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Embedding provider rejected the API key")]
    Unauthorized,
    #[error("Embedding model is loading")]
    ModelLoading,
    #[error("Embedding HTTP error ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("Embedding request failed: {0}")]
    Request(String),
    #[error("Unexpected embedding format: {0}")]
    UnexpectedFormat(String),
    #[error("Max retries exceeded")]
    MaxRetriesExceeded,
}

impl EmbeddingError {
    /// Quota exhaustion needs operator action; everything else may clear up.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EmbeddingError::QuotaExceeded(_))
    }
}

impl Serialize for EmbeddingError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<RetriesExhausted> for EmbeddingError {
    fn from(_: RetriesExhausted) -> Self {
        EmbeddingError::MaxRetriesExceeded
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(e: reqwest::Error) -> Self {
        EmbeddingError::Request(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model is currently loading. Please wait 30-60 seconds and try again.")]
    ModelLoading,
    #[error("Model \"{0}\" is not supported by Inference Providers")]
    ModelNotSupported(String),
    #[error("Model not found or not available: {0}")]
    ModelNotFound(String),
    #[error("Generation provider rejected the API key")]
    Unauthorized,
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl Serialize for GenerationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::GenerationFailed(e.to_string())
    }
}

/// Sampling parameters for a single generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Ask the provider to wait for a cold model instead of failing fast
    pub wait_for_model: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 300,
            temperature: 0.3,
            top_p: 0.95,
            wait_for_model: true,
        }
    }
}

/// Text → raw feature-extraction payload.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn feature_extraction(&self, text: &str) -> Result<FeatureExtractionResponse, EmbeddingError>;
}

/// Prompt → generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, GenerationError>;
}
