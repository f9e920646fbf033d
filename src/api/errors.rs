use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::documents::{AssistantError, IngestError};
use crate::inference::{EmbeddingError, GenerationError};
use crate::vector::VectorStoreError;

const INTERNAL_ERROR: &str = "Failed to process request";

const RETRY_LATER: &str = "An unexpected error occurred. Please try again or contact support if the issue persists.";

/// JSON error body returned by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Generic 500. The cause is logged and never sent to the caller.
    pub fn internal(cause: impl fmt::Display) -> Self {
        error!(error = %cause, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).with_details(RETRY_LATER)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.body.error)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.body.error, "Request failed");
        } else {
            warn!(status = %self.status, error = %self.body.error, "Request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(e: EmbeddingError) -> Self {
        match e {
            EmbeddingError::QuotaExceeded(_) => ApiError::new(StatusCode::PAYMENT_REQUIRED, "Embedding API quota exceeded")
                .with_details("Please add credits to your Hugging Face account or check your billing."),
            EmbeddingError::Unauthorized => ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key")
                .with_details("Please check your Hugging Face API key in environment variables."),
            EmbeddingError::ModelLoading
            | EmbeddingError::Http { .. }
            | EmbeddingError::Request(_)
            | EmbeddingError::MaxRetriesExceeded => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Embedding service unavailable")
                .with_details(e.to_string()),
            EmbeddingError::UnexpectedFormat(_) => ApiError::internal(e),
        }
    }
}

impl From<VectorStoreError> for ApiError {
    fn from(e: VectorStoreError) -> Self {
        match e {
            VectorStoreError::Embedding(inner) => inner.into(),
            VectorStoreError::Unauthorized => ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key")
                .with_details("Please check your Pinecone API key in environment variables."),
            VectorStoreError::DimensionMismatch { .. } => ApiError::internal(e),
            VectorStoreError::Http { .. }
            | VectorStoreError::Request(_)
            | VectorStoreError::IndexNotFound(_)
            | VectorStoreError::IndexNotReady(_)
            | VectorStoreError::Deserialize(_) => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Vector store error")
                .with_details("Failed to connect to Pinecone. Please check your API key and index configuration."),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::ModelNotSupported(_) => ApiError::bad_request("Model not supported")
                .with_details(format!(
                    "{}. Set HF_MODEL to a supported model like 'meta-llama/Llama-3.1-8B-Instruct'",
                    e
                )),
            GenerationError::ModelLoading => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "The AI model is currently loading")
                .with_details("Please wait 30-60 seconds and try again. The model needs time to initialize."),
            GenerationError::ModelNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Model not available")
                .with_details("The requested model is not available through Inference Providers. Please check your HF_MODEL configuration."),
            GenerationError::Unauthorized => ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key")
                .with_details("Please check your Hugging Face API key in environment variables."),
            GenerationError::GenerationFailed(_) => ApiError::internal(e),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::Retrieval(inner) => inner.into(),
            AssistantError::Generation(inner) => inner.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Pdf(_) => ApiError::bad_request("PDF parsing failed")
                .with_details("The PDF file may be corrupted or password-protected."),
            IngestError::VectorStore(inner) => inner.into(),
            IngestError::MissingFile
            | IngestError::NotPdf
            | IngestError::TooLarge { .. }
            | IngestError::EmptyText
            | IngestError::NoChunks => ApiError::bad_request(e.to_string()),
        }
    }
}
