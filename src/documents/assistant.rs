//! Answer Assembly
//!
//! Retrieves the chunks of a document closest to a question, prompts the
//! language model with them, and returns the cleaned answer together with
//! page citations.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::inference::{GenerationError, GenerationOptions, TextGenerator};
use crate::vector::{RetrievalResult, VectorStore, VectorStoreError};

/// Chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

/// Characters of chunk text shown in a citation
pub const CITATION_SNIPPET_CHARS: usize = 150;

pub const NO_CONTEXT_MESSAGE: &str =
    "I couldn't find relevant information in the document to answer your question.";

lazy_static! {
    static ref SPECIAL_TOKEN: Regex = Regex::new(r"<\|.*?\|>").expect("valid token regex");
    static ref ANSWER_PREFIX: Regex = Regex::new(r"(?i)^(answer|response):\s*").expect("valid prefix regex");
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Retrieval(#[from] VectorStoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl Serialize for AssistantError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub citations: Vec<Citation>,
}

/// Question answering over one stored document at a time
#[derive(Clone)]
pub struct Assistant {
    store: VectorStore,
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    top_k: usize,
}

impl Assistant {
    pub fn new(store: VectorStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            options: GenerationOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Answer a question from the chunks of `document_id`.
    ///
    /// Without any retrieved chunk the model is not called and a fixed
    /// message comes back with no citations.
    pub async fn answer(&self, document_id: &str, question: &str) -> Result<ChatResponse, AssistantError> {
        debug!(document_id = %document_id, "Searching vector store");
        let results = self.store.query(document_id, question, self.top_k).await?;

        if results.is_empty() {
            info!(document_id = %document_id, "No relevant chunks found");
            return Ok(ChatResponse {
                message: NO_CONTEXT_MESSAGE.to_string(),
                citations: Vec::new(),
            });
        }

        info!(document_id = %document_id, hits = results.len(), "Generating answer");
        let prompt = build_prompt(&build_context(&results), question);
        let raw = self.generator.generate(&prompt, &self.options).await?;

        Ok(ChatResponse {
            message: clean_response(&raw),
            citations: citations_from(&results),
        })
    }
}

/// Numbered, page-labelled context lines separated by blank lines.
pub fn build_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] (Page {}): {}", i + 1, r.page_number, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions based on provided document context.

Context from document:
{context}

Question: {question}

Instructions:
- Answer based only on the provided context
- Cite page numbers when referencing information
- Be concise and accurate"
    )
}

/// Strip chat-template tokens and a leading `Answer:`/`Response:` label.
pub fn clean_response(raw: &str) -> String {
    let without_tokens = SPECIAL_TOKEN.replace_all(raw, "");
    let trimmed = without_tokens.trim_start();
    ANSWER_PREFIX.replace(trimmed, "").trim().to_string()
}

/// One citation per page, first chunk of each page wins.
pub fn citations_from(results: &[RetrievalResult]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.page_number))
        .map(|r| Citation {
            page_number: r.page_number,
            text: format!("{}...", r.text.chars().take(CITATION_SNIPPET_CHARS).collect::<String>()),
        })
        .collect()
}
