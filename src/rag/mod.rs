//! Retrieval Augmented Generation (RAG) core.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - fixed-size and sentence-aware text chunking
//! - [`rag::embeddings`](crate::rag::embeddings) - the `Embedder` trait and its backends
//! - [`rag::engine`](crate::rag::engine) - ingest and retrieve orchestration
//! - [`rag::builder`](crate::rag::builder) - fluent engine construction
//!
//! # RAG Pipeline
//!
//! 1. **Chunking** - a document is split into bounded chunks
//! 2. **Embedding** - every chunk is turned into a vector
//! 3. **Storage** - vectors and chunk payloads go into a vector store collection
//! 4. **Retrieval** - the query is embedded and the most similar chunks come back
//!
//! # Example
//!
//! ```rust,ignore
//! use raglib::rag::{RagEngineBuilder, RagQueryOptions};
//!
//! let engine = RagEngineBuilder::new()
//!     .use_fixed_size_chunker(512)
//!     .use_hashing_embedder(384)
//!     .use_in_memory_store()
//!     .build()?;
//!
//! engine.ingest("handbook", &text, None).await?;
//! let chunks = engine.retrieve("handbook", "vacation policy", None).await?;
//! ```

pub mod builder;
pub mod chunker;
pub mod embeddings;
pub mod engine;

pub use crate::types::RagQueryOptions;
pub use builder::RagEngineBuilder;
pub use chunker::{Chunker, ChunkingStrategy, FixedSizeChunker, SentenceAwareChunker};
pub use embeddings::{Embedder, EmbedderProvider, HashingEmbedder, OllamaEmbedder};
pub use engine::RagEngine;
