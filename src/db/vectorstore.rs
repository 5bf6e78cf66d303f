//! Vector Store Abstraction Layer
//!
//! This module defines the contract every vector database backend fulfils
//! for the RAG engine, plus an in-memory reference implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VectorStore Trait                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ create_collection │ add │ upsert │ search │ get_by_id │ ... │
//! └─────────────────────────────────────────────────────────────┘
//!                 ▲                          ▲
//!                 │                          │
//!         ┌───────┴───────┐          ┌───────┴───────┐
//!         │   InMemory    │          │    Qdrant     │
//!         │  (default)    │          │ (feature flag)│
//!         └───────────────┘          └───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use raglib::db::{InMemoryVectorStore, VectorStore};
//!
//! let store = InMemoryVectorStore::new();
//! store.create_collection("documents", 384).await?;
//! let id = store.add("documents", &chunk, &embedding).await?;
//! let hits = store.search("documents", &query_embedding, 5, None).await?;
//! ```

use crate::types::{DocumentChunk, PointId, RagError, Result, ScoredChunk};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Configuration for vector store providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Process-local store. Data is lost when the process exits.
    Memory,

    /// Qdrant - High-performance vector search engine.
    ///
    /// Requires a running Qdrant server.
    #[cfg(feature = "qdrant")]
    Qdrant {
        /// Qdrant server URL. Defaults to `QDRANT_URL`, then
        /// "http://localhost:6334".
        #[serde(default = "default_qdrant_url")]
        url: String,
        /// Name of the environment variable holding the API key.
        #[serde(default)]
        api_key_env: Option<String>,
    },
}

#[cfg(feature = "qdrant")]
fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string())
}

impl Default for VectorStoreProvider {
    fn default() -> Self {
        VectorStoreProvider::Memory
    }
}

impl VectorStoreProvider {
    /// Create a vector store instance from this provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or a referenced
    /// API key variable is unset.
    pub fn create_store(&self) -> Result<Arc<dyn VectorStore>> {
        match self {
            VectorStoreProvider::Memory => Ok(Arc::new(InMemoryVectorStore::new())),

            #[cfg(feature = "qdrant")]
            VectorStoreProvider::Qdrant { url, api_key_env } => {
                let api_key = match api_key_env {
                    Some(var) => Some(std::env::var(var).map_err(|_| {
                        RagError::Configuration(format!(
                            "Environment variable '{}' is not set",
                            var
                        ))
                    })?),
                    None => None,
                };
                let store = super::qdrant::QdrantVectorStore::new(url, api_key)?;
                Ok(Arc::new(store))
            }
        }
    }
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector database operations.
///
/// Every failure is reported as a [`RagError`]; the engine propagates them
/// unchanged.
///
/// # Implementors
///
/// - `InMemoryVectorStore` - reference implementation, brute-force cosine
/// - `QdrantVectorStore` - Qdrant server (`qdrant` feature)
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a cosine-similarity collection of `dimensions`-length vectors.
    ///
    /// # Errors
    ///
    /// Implementations either succeed idempotently or fail with
    /// [`RagError::CollectionExists`] when the name is taken.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and all of its points.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Names of all existing collections.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_collections().await?.iter().any(|c| c == name))
    }

    /// Store a chunk under a freshly generated point id.
    async fn add(&self, collection: &str, chunk: &DocumentChunk, vector: &[f32]) -> Result<PointId>;

    /// Batched [`add`](Self::add). Not atomic: points stored before a
    /// failure stay stored.
    async fn add_range(
        &self,
        collection: &str,
        items: &[(DocumentChunk, Vec<f32>)],
    ) -> Result<Vec<PointId>> {
        let mut ids = Vec::with_capacity(items.len());
        for (chunk, vector) in items {
            ids.push(self.add(collection, chunk, vector).await?);
        }
        Ok(ids)
    }

    /// Insert or replace the point stored under `id`.
    async fn upsert(
        &self,
        collection: &str,
        id: PointId,
        chunk: &DocumentChunk,
        vector: &[f32],
    ) -> Result<()>;

    /// Remove a point. Removing an unknown id is not an error.
    async fn delete(&self, collection: &str, id: PointId) -> Result<()>;

    /// Fetch the chunk stored under `id`.
    async fn get_by_id(&self, collection: &str, id: PointId) -> Result<Option<DocumentChunk>>;

    /// Top-`top_k` most similar points, highest score first.
    ///
    /// With `filters`, only points whose payload equals every given
    /// key/value are considered; a point lacking a filtered key is excluded.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
        filters: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Number of points in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

// ============================================================================
// In-Memory Vector Store
// ============================================================================

/// In-memory vector store.
///
/// Data is not persisted. Clones share the same underlying collections.
/// `create_collection` on an existing name fails with
/// [`RagError::CollectionExists`].
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, InMemoryCollection>>>,
}

struct InMemoryCollection {
    dimensions: usize,
    points: HashMap<PointId, StoredPoint>,
    next_seq: u64,
}

struct StoredPoint {
    chunk: DocumentChunk,
    vector: Vec<f32>,
    /// Insertion order, used to keep equal scores in a stable order.
    seq: u64,
}

impl InMemoryCollection {
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if !vector.iter().all(|x| x.is_finite()) {
            return Err(RagError::Validation(
                "Vector contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    fn put(&mut self, id: PointId, chunk: &DocumentChunk, vector: &[f32]) -> Result<()> {
        self.check_vector(vector)?;
        let seq = match self.points.get(&id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.points.insert(
            id,
            StoredPoint {
                chunk: chunk.clone(),
                vector: vector.to_vec(),
                seq,
            },
        );
        Ok(())
    }
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate cosine similarity between two vectors.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn not_found(name: &str) -> RagError {
        RagError::CollectionNotFound(name.to_string())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if dimensions == 0 {
            return Err(RagError::Validation(
                "Collection dimensions must be greater than zero".to_string(),
            ));
        }

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(RagError::CollectionExists(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            InMemoryCollection {
                dimensions,
                points: HashMap::new(),
                next_seq: 0,
            },
        );
        tracing::debug!(collection = name, dimensions, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        collections.remove(name).ok_or_else(|| Self::not_found(name))?;
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read();
        Ok(collections.keys().cloned().collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read();
        Ok(collections.contains_key(name))
    }

    async fn add(&self, collection: &str, chunk: &DocumentChunk, vector: &[f32]) -> Result<PointId> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        let id = Uuid::new_v4();
        col.put(id, chunk, vector)?;
        Ok(id)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: PointId,
        chunk: &DocumentChunk,
        vector: &[f32],
    ) -> Result<()> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        col.put(id, chunk, vector)
    }

    async fn delete(&self, collection: &str, id: PointId) -> Result<()> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        col.points.remove(&id);
        Ok(())
    }

    async fn get_by_id(&self, collection: &str, id: PointId) -> Result<Option<DocumentChunk>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection))?;

        Ok(col.points.get(&id).map(|p| p.chunk.clone()))
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
        filters: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection))?;
        col.check_vector(query)?;

        let mut scored: Vec<(f32, u64, &DocumentChunk)> = col
            .points
            .values()
            .filter(|p| filters.map_or(true, |f| p.chunk.matches_filters(f)))
            .map(|p| (Self::cosine_similarity(query, &p.vector), p.seq, &p.chunk))
            .collect();

        // Sort by score descending, insertion order on ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, _, chunk)| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection))?;
        Ok(col.points.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
