//! Fluent construction of a [`RagEngine`].
//!
//! Dependencies accumulate on the builder and are checked only by
//! [`RagEngineBuilder::build`]. A missing chunker, embedder or store is a
//! [`RagError::Configuration`]; nothing is defaulted.
//!
//! ```rust,ignore
//! use raglib::rag::RagEngineBuilder;
//!
//! let engine = RagEngineBuilder::new()
//!     .use_sentence_aware_chunker(Default::default())
//!     .use_hashing_embedder(384)
//!     .use_in_memory_store()
//!     .build()?;
//! ```

use crate::db::{InMemoryVectorStore, VectorStore};
use crate::rag::chunker::{Chunker, FixedSizeChunker, SentenceAwareChunker};
use crate::rag::embeddings::{Embedder, HashingEmbedder, OllamaEmbedder};
use crate::rag::engine::RagEngine;
use crate::types::{ChunkerOptions, RagError, Result, DEFAULT_TOP_K};
use crate::utils::config::RagConfig;
use std::sync::Arc;
use std::time::Duration;

/// Accumulates engine dependencies until [`build`](Self::build).
///
/// Convenience constructors (`use_*`) that fail record their error against
/// the dependency they were meant to set, and `build` reports it, so the
/// chain stays fluent. Setting that dependency again clears the error.
#[derive(Default)]
pub struct RagEngineBuilder {
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
    timeout: Option<Duration>,
    default_top_k: Option<usize>,
    deferred_errors: Vec<(Slot, RagError)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Chunker,
    Embedder,
    Store,
}

impl RagEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-populated from a configuration file's sections.
    ///
    /// The config is validated first; provider construction errors surface
    /// here rather than at `build`.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;

        let chunker = config
            .chunker
            .strategy
            .create_chunker(config.chunker.options())?;
        let embedder = config.embedder.create_embedder()?;
        let store = config.vector_store.create_store()?;

        let mut builder = Self::new()
            .use_chunker(chunker)
            .use_embedder(embedder)
            .use_vector_store(store)
            .with_default_top_k(config.query.top_k);
        if let Some(secs) = config.query.timeout_secs {
            builder = builder.with_timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    pub fn use_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.clear_error(Slot::Chunker);
        self.chunker = Some(chunker);
        self
    }

    pub fn use_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.clear_error(Slot::Embedder);
        self.embedder = Some(embedder);
        self
    }

    pub fn use_vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.clear_error(Slot::Store);
        self.store = Some(store);
        self
    }

    pub fn use_fixed_size_chunker(self, chunk_size: usize) -> Self {
        let chunker = FixedSizeChunker::with_size(chunk_size);
        self.try_set(Slot::Chunker, chunker, |b, c| b.use_chunker(Arc::new(c)))
    }

    pub fn use_sentence_aware_chunker(self, options: ChunkerOptions) -> Self {
        let chunker = SentenceAwareChunker::new(options);
        self.try_set(Slot::Chunker, chunker, |b, c| b.use_chunker(Arc::new(c)))
    }

    /// Offline feature-hashing embedder.
    pub fn use_hashing_embedder(self, dimensions: usize) -> Self {
        let embedder = HashingEmbedder::new(dimensions);
        self.try_set(Slot::Embedder, embedder, |b, e| b.use_embedder(Arc::new(e)))
    }

    /// Embedder calling an Ollama server at `url`. No request is made until
    /// the first embed.
    pub fn use_ollama_embedder(
        self,
        url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        let embedder = OllamaEmbedder::new(url.into(), model.into(), dimensions);
        self.try_set(Slot::Embedder, embedder, |b, e| b.use_embedder(Arc::new(e)))
    }

    pub fn use_in_memory_store(self) -> Self {
        self.use_vector_store(Arc::new(InMemoryVectorStore::new()))
    }

    /// Qdrant store at `url`. The client connects lazily.
    #[cfg(feature = "qdrant")]
    pub fn use_qdrant_store(self, url: &str, api_key: Option<String>) -> Self {
        let store = crate::db::QdrantVectorStore::new(url, api_key);
        self.try_set(Slot::Store, store, |b, s| b.use_vector_store(Arc::new(s)))
    }

    /// Deadline for each embedder and store call made by the engine.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `top_k` used when a query passes no options. Defaults to 3.
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = Some(top_k);
        self
    }

    /// Wire the engine.
    ///
    /// # Errors
    ///
    /// The oldest convenience-constructor error not cleared by a later
    /// setter, otherwise
    /// [`RagError::Configuration`] naming the first missing dependency.
    pub fn build(self) -> Result<RagEngine> {
        if let Some((_, err)) = self.deferred_errors.into_iter().next() {
            return Err(err);
        }

        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Configuration("Embedder is not configured.".to_string()))?;
        let store = self.store.ok_or_else(|| {
            RagError::Configuration("Vector store is not configured.".to_string())
        })?;
        let chunker = self
            .chunker
            .ok_or_else(|| RagError::Configuration("Chunker is not configured.".to_string()))?;

        let default_top_k = self.default_top_k.unwrap_or(DEFAULT_TOP_K);
        if default_top_k == 0 {
            return Err(RagError::Configuration(
                "Default top_k must be greater than zero.".to_string(),
            ));
        }

        Ok(RagEngine::new(
            chunker,
            embedder,
            store,
            self.timeout,
            default_top_k,
        ))
    }

    fn try_set<T>(
        mut self,
        slot: Slot,
        value: Result<T>,
        set: impl FnOnce(Self, T) -> Self,
    ) -> Self {
        match value {
            Ok(value) => set(self, value),
            Err(err) => {
                self.clear_error(slot);
                self.deferred_errors.push((slot, err));
                self
            }
        }
    }

    fn clear_error(&mut self, slot: Slot) {
        self.deferred_errors.retain(|(s, _)| *s != slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn complete() -> RagEngineBuilder {
        RagEngineBuilder::new()
            .use_fixed_size_chunker(32)
            .use_hashing_embedder(16)
            .use_in_memory_store()
    }

    #[rstest]
    #[case::no_embedder(RagEngineBuilder::new().use_fixed_size_chunker(8).use_in_memory_store(), "Embedder")]
    #[case::no_store(RagEngineBuilder::new().use_fixed_size_chunker(8).use_hashing_embedder(4), "Vector store")]
    #[case::no_chunker(RagEngineBuilder::new().use_hashing_embedder(4).use_in_memory_store(), "Chunker")]
    fn test_build_requires_every_dependency(
        #[case] builder: RagEngineBuilder,
        #[case] missing: &str,
    ) {
        match builder.build() {
            Err(RagError::Configuration(msg)) => assert!(msg.starts_with(missing), "{}", msg),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_with_all_dependencies() {
        let engine = complete().build().unwrap();
        assert_eq!(engine.chunker().name(), "fixed-size");
        assert_eq!(engine.embedder().dimensions(), 16);
        assert_eq!(engine.store().provider_name(), "in-memory");
        assert_eq!(engine.default_top_k(), DEFAULT_TOP_K);
        assert_eq!(engine.timeout(), None);
    }

    #[test]
    fn test_deferred_constructor_error_reported_at_build() {
        let result = complete().use_fixed_size_chunker(0).build();
        assert!(matches!(result, Err(RagError::Validation(_))));

        let result = complete().use_hashing_embedder(0).build();
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }

    #[test]
    fn test_replacing_a_failed_dependency_clears_its_error() {
        let engine = complete()
            .use_fixed_size_chunker(0)
            .use_chunker(Arc::new(FixedSizeChunker::with_size(16).unwrap()))
            .build()
            .unwrap();
        assert_eq!(engine.chunker().name(), "fixed-size");

        let engine = complete()
            .use_hashing_embedder(0)
            .use_hashing_embedder(8)
            .build()
            .unwrap();
        assert_eq!(engine.embedder().dimensions(), 8);

        // A failure in another slot still surfaces
        let result = complete()
            .use_hashing_embedder(0)
            .use_chunker(Arc::new(FixedSizeChunker::with_size(16).unwrap()))
            .build();
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }

    #[test]
    fn test_later_setter_replaces_earlier() {
        let engine = complete()
            .use_sentence_aware_chunker(ChunkerOptions::default())
            .with_timeout(Duration::from_secs(2))
            .with_default_top_k(7)
            .build()
            .unwrap();

        assert_eq!(engine.chunker().name(), "sentence-aware");
        assert_eq!(engine.timeout(), Some(Duration::from_secs(2)));
        assert_eq!(engine.default_top_k(), 7);
    }

    #[test]
    fn test_zero_default_top_k_rejected() {
        let result = complete().with_default_top_k(0).build();
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }

    #[test]
    fn test_ollama_embedder_builds_without_network() {
        let engine = complete()
            .use_ollama_embedder("http://127.0.0.1:1", "nomic-embed-text", 768)
            .build()
            .unwrap();
        assert_eq!(engine.embedder().name(), "ollama");
        assert_eq!(engine.embedder().dimensions(), 768);
    }
}
