//! Hugging Face HTTP Client
//!
//! Direct reqwest client for the Hugging Face inference router: the
//! feature-extraction pipeline for embeddings and the OpenAI-compatible
//! chat-completions endpoint for generation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FeatureExtractionResponse};
use super::{EmbeddingError, FeatureExtractor, GenerationError, GenerationOptions, TextGenerator};

pub const DEFAULT_ROUTER_URL: &str = "https://router.huggingface.co";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_GENERATION_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// Hugging Face inference client. Stateless after construction.
#[derive(Clone)]
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
}

impl HuggingFaceClient {
    pub fn new(api_key: &str, embedding_model: &str, generation_model: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: DEFAULT_ROUTER_URL.to_string(),
            api_key: api_key.trim().to_string(),
            embedding_model: embedding_model.to_string(),
            generation_model: generation_model.to_string(),
        }
    }

    /// Point the client at a different router (proxies, self-hosted gateways).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    fn feature_extraction_url(&self) -> String {
        format!(
            "{}/hf-inference/models/{}/pipeline/feature-extraction",
            self.base_url, self.embedding_model
        )
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl FeatureExtractor for HuggingFaceClient {
    async fn feature_extraction(&self, text: &str) -> Result<FeatureExtractionResponse, EmbeddingError> {
        debug!(model = %self.embedding_model, chars = text.len(), "Feature extraction call");
        let resp = self.http.post(self.feature_extraction_url())
            .bearer_auth(&self.api_key)
            .json(&json!({ "inputs": text }))
            .send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Feature extraction failed");
            return Err(classify_embedding_failure(status, body));
        }

        serde_json::from_str(&body)
            .map_err(|e| EmbeddingError::UnexpectedFormat(format!("{}: {}", e, truncate(&body, 200))))
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            model: &self.generation_model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: options.max_new_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stream: false,
        };

        info!(model = %self.generation_model, max_tokens = options.max_new_tokens, "Hugging Face inference call");
        let mut builder = self.http.post(self.chat_completions_url())
            .bearer_auth(&self.api_key)
            .json(&request);
        if options.wait_for_model {
            builder = builder.header("X-Wait-For-Model", "true");
        }
        let resp = builder.send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Hugging Face API error");
            return Err(classify_generation_failure(status, &body, &self.generation_model));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|_| {
            GenerationError::GenerationFailed(format!(
                "Unexpected response format from HF API: {}",
                truncate(&body, 200)
            ))
        })?;
        debug!("Hugging Face response received");
        parsed.into_text()
    }
}

/// Map a non-success feature-extraction status onto the embedding taxonomy.
pub fn classify_embedding_failure(status: StatusCode, body: String) -> EmbeddingError {
    let lowered = body.to_lowercase();
    match status {
        StatusCode::PAYMENT_REQUIRED => EmbeddingError::QuotaExceeded(body),
        _ if lowered.contains("insufficient_quota") || lowered.contains("exceeded your monthly") => {
            EmbeddingError::QuotaExceeded(body)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbeddingError::Unauthorized,
        StatusCode::SERVICE_UNAVAILABLE => EmbeddingError::ModelLoading,
        _ => EmbeddingError::Http { status: status.as_u16(), body },
    }
}

/// Map a non-success chat-completions status onto the generation taxonomy.
pub fn classify_generation_failure(status: StatusCode, body: &str, model: &str) -> GenerationError {
    match status {
        StatusCode::BAD_REQUEST
            if body.contains("model_not_supported") || body.contains("not supported") =>
        {
            GenerationError::ModelNotSupported(model.to_string())
        }
        StatusCode::UNAUTHORIZED => GenerationError::Unauthorized,
        StatusCode::SERVICE_UNAVAILABLE => GenerationError::ModelLoading,
        StatusCode::NOT_FOUND => GenerationError::ModelNotFound(model.to_string()),
        _ => GenerationError::GenerationFailed(format!("Hugging Face API error: {}: {}", status, body)),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
