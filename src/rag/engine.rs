//! Ingestion and retrieval orchestration.
//!
//! ```text
//! ingest:   document -> Chunker -> [chunk] -> Embedder -> VectorStore::add
//! retrieve: query -> Embedder -> VectorStore::search -> [chunk] (ranked)
//! ```
//!
//! The engine holds no state besides its three collaborators and never
//! retries or wraps their failures.

use crate::db::VectorStore;
use crate::rag::chunker::Chunker;
use crate::rag::embeddings::Embedder;
use crate::types::{
    DocumentChunk, DocumentMetadata, RagError, RagQueryOptions, Result, ScoredChunk,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Wires a [`Chunker`], an [`Embedder`] and a [`VectorStore`] together.
///
/// Build one with [`RagEngineBuilder`](crate::rag::builder::RagEngineBuilder).
#[derive(Clone)]
pub struct RagEngine {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    timeout: Option<Duration>,
    default_top_k: usize,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("chunker", &self.chunker.name())
            .field("embedder", &self.embedder.name())
            .field("store", &self.store.provider_name())
            .field("timeout", &self.timeout)
            .field("default_top_k", &self.default_top_k)
            .finish()
    }
}

impl RagEngine {
    pub(crate) fn new(
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        timeout: Option<Duration>,
        default_top_k: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            timeout,
            default_top_k,
        }
    }

    pub fn chunker(&self) -> &Arc<dyn Chunker> {
        &self.chunker
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Deadline applied to each collaborator call, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `top_k` used when `retrieve`/`search` get no options.
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Chunk, embed and store `document` in `collection`.
    ///
    /// The collection is created with the embedder's dimensionality when it
    /// does not exist yet. Chunks are embedded and stored one at a time in
    /// index order; the first failure aborts the call and leaves the chunks
    /// stored so far in place.
    ///
    /// Returns the number of chunks stored.
    #[instrument(skip_all, fields(collection = %collection, chars = document.chars().count()))]
    pub async fn ingest(
        &self,
        collection: &str,
        document: &str,
        metadata: Option<DocumentMetadata>,
    ) -> Result<usize> {
        self.ensure_collection(collection).await?;

        let chunks = self.chunker.chunk(document, metadata);
        debug!(chunker = self.chunker.name(), count = chunks.len(), "chunked document");

        for chunk in &chunks {
            let vector = self
                .bounded("embed chunk", self.embedder.embed(&chunk.content))
                .await?;
            let id = self
                .bounded("add chunk", self.store.add(collection, chunk, &vector))
                .await?;
            debug!(index = chunk.index, point_id = %id, "stored chunk");
        }

        info!(
            collection = %collection,
            chunks = chunks.len(),
            "Document ingested"
        );

        Ok(chunks.len())
    }

    /// Chunks most similar to `query`, best first.
    ///
    /// `top_k` falls back to the engine default (3 unless configured) when
    /// `options` is `None`.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn retrieve(
        &self,
        collection: &str,
        query: &str,
        options: Option<&RagQueryOptions>,
    ) -> Result<Vec<DocumentChunk>> {
        let results = self.search(collection, query, options).await?;
        Ok(results.into_iter().map(|scored| scored.chunk).collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps the similarity scores.
    ///
    /// # Errors
    ///
    /// [`RagError::Validation`] when `top_k` is zero.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        options: Option<&RagQueryOptions>,
    ) -> Result<Vec<ScoredChunk>> {
        let top_k = options.map_or(self.default_top_k, |o| o.top_k);
        if top_k == 0 {
            return Err(RagError::Validation(
                "top_k must be greater than zero".to_string(),
            ));
        }
        let filters = options.and_then(|o| o.metadata_filters.as_ref());

        let vector = self
            .bounded("embed query", self.embedder.embed(query))
            .await?;
        let results = self
            .bounded(
                "search",
                self.store.search(collection, &vector, top_k, filters),
            )
            .await?;

        info!(
            collection = %collection,
            top_k,
            results = results.len(),
            "Search completed"
        );

        Ok(results)
    }

    /// Create `collection` unless it is already listed.
    ///
    /// Two ingests may both see the collection missing; the loser's
    /// `CollectionExists` counts as success.
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let existing = self
            .bounded("list collections", self.store.list_collections())
            .await?;
        if existing.iter().any(|name| name == collection) {
            return Ok(());
        }

        let dimensions = self.embedder.dimensions();
        match self
            .bounded(
                "create collection",
                self.store.create_collection(collection, dimensions),
            )
            .await
        {
            Ok(()) => {
                debug!(collection = %collection, dimensions, "created collection");
                Ok(())
            }
            Err(RagError::CollectionExists(_)) => {
                warn!(
                    collection = %collection,
                    "collection was created concurrently, continuing"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                RagError::Timeout(format!("{} exceeded {}ms", operation, limit.as_millis()))
            })?,
            None => fut.await,
        }
    }
}
