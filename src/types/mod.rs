use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

// ============= Document Types =============

/// Identifier assigned to a stored point in a vector store collection.
pub type PointId = Uuid;

/// Source context shared by every chunk cut from one document.
///
/// Chunks hold an `Arc<DocumentMetadata>`, so all chunks of a document
/// observe the same `document_id` without copying the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Globally unique document identifier.
    pub document_id: Uuid,
    /// Original file name (e.g. `handbook.pdf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Full or relative path to the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Physical page the text came from, for paginated sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Free-form tags (language, content type, owner, ...).
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

impl DocumentMetadata {
    /// Metadata with a freshly generated document id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Metadata for a known document id.
    pub fn with_id(document_id: Uuid) -> Self {
        Self {
            document_id,
            file_name: None,
            file_path: None,
            page_number: None,
            custom: HashMap::new(),
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Add a custom key/value tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload keys reserved for chunk fields. Custom tags using one of these
/// names are shadowed by the field.
pub const PAYLOAD_INDEX: &str = "index";
pub const PAYLOAD_CONTENT: &str = "content";
pub const PAYLOAD_DOCUMENT_ID: &str = "document_id";
pub const PAYLOAD_FILE_NAME: &str = "file_name";
pub const PAYLOAD_FILE_PATH: &str = "file_path";
pub const PAYLOAD_PAGE_NUMBER: &str = "page_number";

/// A bounded fragment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Position within the chunking call that produced it, starting at 0.
    pub index: usize,
    pub content: String,
    pub metadata: Arc<DocumentMetadata>,
}

impl DocumentChunk {
    pub fn new(index: usize, content: impl Into<String>, metadata: Arc<DocumentMetadata>) -> Self {
        Self {
            index,
            content: content.into(),
            metadata,
        }
    }

    /// Resolve a metadata filter key against this chunk.
    ///
    /// Known field names win over custom tags of the same name. A key that
    /// is neither a field nor a tag yields `None`.
    pub fn payload_value(&self, key: &str) -> Option<String> {
        let meta = &self.metadata;
        match key {
            PAYLOAD_INDEX => Some(self.index.to_string()),
            PAYLOAD_CONTENT => Some(self.content.clone()),
            PAYLOAD_DOCUMENT_ID => Some(meta.document_id.to_string()),
            PAYLOAD_FILE_NAME => meta.file_name.clone(),
            PAYLOAD_FILE_PATH => meta.file_path.clone(),
            PAYLOAD_PAGE_NUMBER => meta.page_number.map(|p| p.to_string()),
            other => meta.custom.get(other).cloned(),
        }
    }

    /// True when every filter entry equals the chunk's payload value.
    pub fn matches_filters(&self, filters: &HashMap<String, String>) -> bool {
        filters
            .iter()
            .all(|(key, value)| self.payload_value(key).as_deref() == Some(value.as_str()))
    }
}

/// A chunk returned from a similarity search with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

// ============= Options =============

/// Sizing knobs for the chunkers, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerOptions {
    /// Target maximum chunk size.
    pub chunk_size: usize,
    /// Target amount carried over from one chunk into the next.
    pub chunk_overlap: usize,
    /// Chunks shorter than this are dropped by the sentence-aware chunker.
    pub min_chunk_size: usize,
}

impl ChunkerOptions {
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    /// Reject options no chunker can make progress with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Validation(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.min_chunk_size > self.chunk_size {
            return Err(RagError::Validation(format!(
                "min_chunk_size ({}) must not exceed chunk_size ({})",
                self.min_chunk_size, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_size: 200,
        }
    }
}

/// Default number of chunks returned by a retrieval.
pub const DEFAULT_TOP_K: usize = 3;

/// Query-time retrieval options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagQueryOptions {
    pub top_k: usize,
    /// Conjunctive equality constraints on chunk payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_filters: Option<HashMap<String, String>>,
}

impl RagQueryOptions {
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            metadata_filters: None,
        }
    }

    /// Add an equality filter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata_filters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl Default for RagQueryOptions {
    fn default() -> Self {
        Self::top_k(DEFAULT_TOP_K)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
