//! # raglib
//!
//! The ingestion and retrieval core of a Retrieval Augmented Generation
//! pipeline: split documents into chunks, embed them, store the vectors and
//! find the chunks most similar to a query.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use raglib::{RagEngineBuilder, RagQueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = RagEngineBuilder::new()
//!         .use_sentence_aware_chunker(Default::default())
//!         .use_hashing_embedder(384)
//!         .use_in_memory_store()
//!         .build()?;
//!
//!     engine.ingest("handbook", &std::fs::read_to_string("handbook.md")?, None).await?;
//!
//!     let options = RagQueryOptions::top_k(5);
//!     for chunk in engine.retrieve("handbook", "vacation policy", Some(&options)).await? {
//!         println!("{}: {}", chunk.index, chunk.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use raglib::{RagConfig, RagEngineBuilder};
//!
//! let config = RagConfig::load("raglib.toml")?;
//! let engine = RagEngineBuilder::from_config(&config)?.build()?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `qdrant` | Qdrant vector database |
//!
//! ## Modules
//!
//! - [`rag`] - Chunkers, embedders, the engine and its builder
//! - [`db`] - Vector store contract and implementations
//! - [`types`] - Chunks, metadata, query options and errors
//! - [`utils`] - TOML configuration
//! - [`cli`] - Argument parsing and output for the `raglib` binary

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface for the `raglib` binary.
pub mod cli;
/// Vector stores (in-memory, Qdrant).
pub mod db;
/// Chunking, embedding and the RAG engine.
pub mod rag;
/// Core types (chunks, metadata, options, errors).
pub mod types;
/// Configuration loading (TOML).
pub mod utils;

// Re-export commonly used types
pub use db::{InMemoryVectorStore, VectorStore};
pub use rag::{
    Chunker, Embedder, FixedSizeChunker, HashingEmbedder, RagEngine, RagEngineBuilder,
    SentenceAwareChunker,
};
pub use types::{
    ChunkerOptions, DocumentChunk, DocumentMetadata, RagError, RagQueryOptions, Result,
    ScoredChunk,
};
pub use utils::config::RagConfig;
