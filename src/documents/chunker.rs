//! Document Chunking
//!
//! Splits extracted PDF text into overlapping, page-annotated chunks for
//! embedding and retrieval.
//!
//! Extracted text carries no reliable page boundaries, so page numbers are
//! estimated: an in-text `page N` marker resets the counter, and every third
//! emitted chunk advances it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum chunk length in characters before a flush
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Overlap budget in characters carried into the next chunk
pub const DEFAULT_OVERLAP: usize = 200;

/// Approximate characters per word when converting overlap to words
const CHARS_PER_OVERLAP_WORD: usize = 5;

/// Every Nth emitted chunk bumps the page estimate
const CHUNKS_PER_PAGE_ESTIMATE: u32 = 3;

lazy_static! {
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence regex");
    static ref PAGE_MARKER: Regex = Regex::new(r"(?i)\bpage\s+(\d+)\b").expect("valid page regex");
}

/// A chunk of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub text: String,
    /// Best-effort page estimate (1-based)
    pub page_number: u32,
    /// Position within the document (0-based)
    pub chunk_index: u32,
}

/// Chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Split text into sentence runs ending in `.`, `!` or `?`.
///
/// Text after the last terminator is kept as a final run. Input without
/// any terminator comes back as a single run.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0usize;

    for m in SENTENCE.find_iter(text) {
        sentences.push(m.as_str());
        last_end = m.end();
    }

    let remainder = &text[last_end..];
    if !sentences.is_empty() && !remainder.trim().is_empty() {
        sentences.push(remainder);
    }

    if sentences.is_empty() {
        sentences.push(text);
    }
    sentences
}

/// Page number from an in-text `page N` marker, if any.
pub fn page_marker(sentence: &str) -> Option<u32> {
    PAGE_MARKER
        .captures(sentence)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|page| *page > 0)
}

/// Chunk text with the default size and overlap.
pub fn chunk_text(text: &str) -> Vec<Chunk> {
    chunk_text_with(text, ChunkOptions::default())
}

/// Chunk text into overlapping segments.
///
/// Pure: identical input always yields identical chunks. Empty or
/// whitespace-only input yields no chunks.
pub fn chunk_text_with(text: &str, options: ChunkOptions) -> Vec<Chunk> {
    let overlap_words = options.overlap / CHARS_PER_OVERLAP_WORD;

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();
    let mut current_page = 1u32;
    let mut chunk_index = 0u32;

    for raw in split_sentences(text) {
        let sentence = raw.trim();

        if let Some(page) = page_marker(sentence) {
            current_page = page;
        }

        if chunk_index > 0 && chunk_index % CHUNKS_PER_PAGE_ESTIMATE == 0 {
            current_page = current_page.saturating_add(1);
        }

        let combined_len = current_chunk.chars().count() + sentence.chars().count();
        if combined_len > options.chunk_size && !current_chunk.is_empty() {
            chunks.push(Chunk {
                text: current_chunk.trim().to_string(),
                page_number: current_page,
                chunk_index,
            });
            chunk_index += 1;

            current_chunk = if overlap_words == 0 {
                sentence.to_string()
            } else {
                let words: Vec<&str> = current_chunk.split(' ').collect();
                let start = words.len().saturating_sub(overlap_words);
                format!("{} {}", words[start..].join(" "), sentence)
            };
        } else {
            if !current_chunk.is_empty() {
                current_chunk.push(' ');
            }
            current_chunk.push_str(sentence);
        }
    }

    // Save final chunk
    let remainder = current_chunk.trim();
    if !remainder.is_empty() {
        chunks.push(Chunk {
            text: remainder.to_string(),
            page_number: current_page,
            chunk_index,
        });
    }

    chunks
}
