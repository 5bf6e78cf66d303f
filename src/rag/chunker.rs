//! Document chunking strategies.
//!
//! Two interchangeable [`Chunker`] implementations:
//!
//! - [`FixedSizeChunker`] - slices the text into windows of exactly
//!   `chunk_size` characters (the last one may be shorter). No overlap.
//! - [`SentenceAwareChunker`] - groups whole sentences until `chunk_size` is
//!   reached and seeds the next chunk with trailing sentences of the previous
//!   one, so context survives the boundary.
//!
//! All sizes are measured in characters, not bytes, and slicing never splits
//! a UTF-8 code point.

use crate::types::{ChunkerOptions, DocumentChunk, DocumentMetadata, RagError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Splits a document into an ordered sequence of chunks.
///
/// Every chunk produced by one call shares the same metadata record. When no
/// metadata is supplied a fresh record with a new document id is attached.
pub trait Chunker: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Split `text` into chunks indexed densely from 0.
    fn chunk(&self, text: &str, metadata: Option<DocumentMetadata>) -> Vec<DocumentChunk>;
}

/// Chunking strategy selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    Fixed,
    #[default]
    Sentence,
}

impl ChunkingStrategy {
    pub fn create_chunker(self, options: ChunkerOptions) -> Result<Arc<dyn Chunker>> {
        Ok(match self {
            ChunkingStrategy::Fixed => Arc::new(FixedSizeChunker::new(options)?),
            ChunkingStrategy::Sentence => Arc::new(SentenceAwareChunker::new(options)?),
        })
    }
}

fn ensure_chunk_size(options: &ChunkerOptions) -> Result<()> {
    if options.chunk_size == 0 {
        return Err(RagError::Validation(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ============================================================================
// Fixed-size
// ============================================================================

/// Cuts text into consecutive `chunk_size`-character windows.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    options: ChunkerOptions,
}

impl FixedSizeChunker {
    /// Fails with [`RagError::Validation`] when `chunk_size` is zero.
    pub fn new(options: ChunkerOptions) -> Result<Self> {
        ensure_chunk_size(&options)?;
        Ok(Self { options })
    }

    /// Chunker with only the window size set; overlap and minimum are unused.
    pub fn with_size(chunk_size: usize) -> Result<Self> {
        Self::new(ChunkerOptions {
            chunk_size,
            ..ChunkerOptions::default()
        })
    }

    pub fn options(&self) -> &ChunkerOptions {
        &self.options
    }
}

impl Chunker for FixedSizeChunker {
    fn name(&self) -> &'static str {
        "fixed-size"
    }

    fn chunk(&self, text: &str, metadata: Option<DocumentMetadata>) -> Vec<DocumentChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let metadata = Arc::new(metadata.unwrap_or_default());
        let mut starts = text
            .char_indices()
            .map(|(offset, _)| offset)
            .step_by(self.options.chunk_size)
            .peekable();

        let mut chunks = Vec::new();
        while let Some(start) = starts.next() {
            let end = starts.peek().copied().unwrap_or(text.len());
            chunks.push(DocumentChunk::new(
                chunks.len(),
                &text[start..end],
                Arc::clone(&metadata),
            ));
        }

        chunks
    }
}

// ============================================================================
// Sentence-aware
// ============================================================================

/// Sentence terminator, the whitespace run after it, and the uppercase
/// letter that opens the next sentence.
const SENTENCE_BOUNDARY: &str = r"[.!?]\s+[A-Z]";

/// Groups sentences into chunks with trailing-sentence overlap.
#[derive(Debug, Clone)]
pub struct SentenceAwareChunker {
    options: ChunkerOptions,
    boundary: Regex,
}

impl SentenceAwareChunker {
    /// Fails with [`RagError::Validation`] when `chunk_size` is zero.
    pub fn new(options: ChunkerOptions) -> Result<Self> {
        ensure_chunk_size(&options)?;
        let boundary = Regex::new(SENTENCE_BOUNDARY)
            .map_err(|e| RagError::Configuration(format!("Invalid sentence pattern: {}", e)))?;
        Ok(Self { options, boundary })
    }

    pub fn options(&self) -> &ChunkerOptions {
        &self.options
    }

    /// Split on whitespace that follows `.`, `!` or `?` and precedes an
    /// uppercase letter. The terminator stays with the left sentence, the
    /// whitespace is dropped, and blank segments are discarded.
    pub fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        // Terminator and capital are single-byte ASCII, so the whitespace
        // run is the match minus one byte on each side.
        for boundary in self.boundary.find_iter(text) {
            sentences.push(&text[start..boundary.start() + 1]);
            start = boundary.end() - 1;
        }
        sentences.push(&text[start..]);

        sentences.retain(|s| !s.trim().is_empty());
        sentences
    }

    /// Trailing sentences of a closed chunk, walked backwards until at least
    /// `target` characters have been collected.
    fn overlap_seed(buffer: &[String], target: usize) -> String {
        let mut collected = 0;
        let mut first = buffer.len();

        for (i, sentence) in buffer.iter().enumerate().rev() {
            first = i;
            collected += char_len(sentence);
            if collected >= target {
                break;
            }
        }

        buffer[first..].join(" ").trim_end().to_string()
    }
}

impl Chunker for SentenceAwareChunker {
    fn name(&self) -> &'static str {
        "sentence-aware"
    }

    fn chunk(&self, text: &str, metadata: Option<DocumentMetadata>) -> Vec<DocumentChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let metadata = Arc::new(metadata.unwrap_or_default());
        let sentences = self.split_sentences(text);
        let last = sentences.len().saturating_sub(1);

        let mut chunks = Vec::new();
        let mut buffer: Vec<String> = Vec::new();
        let mut buffered_len = 0;

        for (i, sentence) in sentences.iter().enumerate() {
            buffer.push((*sentence).to_string());
            buffered_len += char_len(sentence);

            if buffered_len < self.options.chunk_size && i != last {
                continue;
            }

            let content = buffer.join(" ");
            if char_len(&content) >= self.options.min_chunk_size {
                chunks.push(DocumentChunk::new(
                    chunks.len(),
                    content,
                    Arc::clone(&metadata),
                ));
            } else {
                tracing::trace!(
                    length = char_len(&content),
                    min = self.options.min_chunk_size,
                    "dropping undersized chunk"
                );
            }

            let seed = Self::overlap_seed(&buffer, self.options.chunk_overlap);
            buffered_len = char_len(&seed);
            buffer = vec![seed];
        }

        chunks
    }
}
