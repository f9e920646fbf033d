//! Wire shapes for Hugging Face responses.
//!
//! Providers answer with one of a small closed set of JSON shapes, so each
//! response is an untagged enum that callers match exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GenerationError;

/// Feature-extraction payload: one pooled vector, per-token vectors, or an error object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureExtractionResponse {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
    Failure { error: Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

/// Chat-completion payload: choices on success, an error object otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChatCompletionResponse {
    Completion { choices: Vec<ChatChoice> },
    Failure { error: Value },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Trimmed content of the first choice.
    pub fn into_text(self) -> Result<String, GenerationError> {
        match self {
            ChatCompletionResponse::Completion { choices } => choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content)
                .map(|content| content.trim().to_string())
                .ok_or_else(|| GenerationError::GenerationFailed(
                    "Unexpected response format: no message content in choices".to_string(),
                )),
            ChatCompletionResponse::Failure { error } => {
                Err(GenerationError::GenerationFailed(format!("HF Model Error: {}", error)))
            }
        }
    }
}
