//! Mock collaborators for engine tests.
//!
//! Recording embedders and stores let tests assert exactly which calls the
//! engine made, and failing variants inject errors at a chosen call.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use raglib::db::{InMemoryVectorStore, VectorStore};
use raglib::rag::Embedder;
use raglib::types::{DocumentChunk, PointId, RagError, Result, ScoredChunk};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Embedder returning a fixed unit vector and recording every input.
///
/// With `fail_on(n)` the `n`-th call (0-based) returns an embedding error.
#[derive(Default)]
pub struct RecordingEmbedder {
    pub inputs: Mutex<Vec<String>>,
    fail_on: Option<usize>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(call: usize) -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
            fail_on: Some(call),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = {
            let mut inputs = self.inputs.lock();
            inputs.push(text.to_string());
            inputs.len() - 1
        };
        if self.fail_on == Some(call) {
            return Err(RagError::Embedding("Mock embedding failure".to_string()));
        }
        Ok(vec![1.0, 0.0, 0.0])
    }
}

/// One call observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ListCollections,
    CreateCollection { name: String, dimensions: usize },
    Add { collection: String, index: usize },
    Search { collection: String, top_k: usize, filtered: bool },
}

/// In-memory store wrapper that records calls and can inject failures.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryVectorStore,
    pub calls: Mutex<Vec<StoreCall>>,
    /// Fail the `n`-th `add` (0-based) with a store error.
    fail_add_on: Option<usize>,
    adds: AtomicUsize,
    /// Report every collection as missing from `list_collections`, as if
    /// another ingest created it in between.
    hide_collections: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_add_on(call: usize) -> Self {
        Self {
            fail_add_on: Some(call),
            ..Self::default()
        }
    }

    /// A store whose listing always lags behind creation.
    pub fn racing() -> Self {
        Self {
            hide_collections: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn inner(&self) -> &InMemoryVectorStore {
        &self.inner
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn provider_name(&self) -> &'static str {
        "recording"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.record(StoreCall::CreateCollection {
            name: name.to_string(),
            dimensions,
        });
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.record(StoreCall::ListCollections);
        if self.hide_collections {
            return Ok(Vec::new());
        }
        self.inner.list_collections().await
    }

    async fn add(&self, collection: &str, chunk: &DocumentChunk, vector: &[f32]) -> Result<PointId> {
        self.record(StoreCall::Add {
            collection: collection.to_string(),
            index: chunk.index,
        });
        let call = self.adds.fetch_add(1, Ordering::SeqCst);
        if self.fail_add_on == Some(call) {
            return Err(RagError::Store("Mock add failure".to_string()));
        }
        self.inner.add(collection, chunk, vector).await
    }

    async fn upsert(
        &self,
        collection: &str,
        id: PointId,
        chunk: &DocumentChunk,
        vector: &[f32],
    ) -> Result<()> {
        self.inner.upsert(collection, id, chunk, vector).await
    }

    async fn delete(&self, collection: &str, id: PointId) -> Result<()> {
        self.inner.delete(collection, id).await
    }

    async fn get_by_id(&self, collection: &str, id: PointId) -> Result<Option<DocumentChunk>> {
        self.inner.get_by_id(collection, id).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
        filters: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ScoredChunk>> {
        self.record(StoreCall::Search {
            collection: collection.to_string(),
            top_k,
            filtered: filters.is_some(),
        });
        self.inner.search(collection, query, top_k, filters).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.inner.count(collection).await
    }
}
