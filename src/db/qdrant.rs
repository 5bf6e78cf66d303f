use crate::types::{
    DocumentChunk, DocumentMetadata, PointId, RagError, Result, ScoredChunk, PAYLOAD_CONTENT,
    PAYLOAD_DOCUMENT_ID, PAYLOAD_FILE_NAME, PAYLOAD_FILE_PATH, PAYLOAD_INDEX, PAYLOAD_PAGE_NUMBER,
};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        condition::ConditionOneOf, point_id::PointIdOptions, r#match::MatchValue, Condition,
        CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
        FieldCondition, Filter, GetPointsBuilder, Match, PointId as QdrantPointId, PointStruct,
        SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::vectorstore::VectorStore;

/// Qdrant vector store implementation.
///
/// Collections use cosine distance. `create_collection` is idempotent: an
/// existing collection is left untouched.
///
/// Chunk fields are stored as payload keys (`index`, `content`,
/// `document_id`, `file_name`, `file_path`, `page_number`) next to the
/// document's custom tags, so metadata filters address both the same way.
pub struct QdrantVectorStore {
    client: Qdrant,
}

fn store_err(action: &str) -> impl FnOnce(qdrant_client::QdrantError) -> RagError + '_ {
    move |e| RagError::Store(format!("Failed to {}: {}", action, e))
}

/// Whether a Qdrant error message reports a collection that already exists.
fn is_already_exists(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already exists") || message.contains("alreadyexists")
}

fn point_id(id: PointId) -> QdrantPointId {
    QdrantPointId::from(id.to_string())
}

impl QdrantVectorStore {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Configuration(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self { client })
    }

    fn to_payload(chunk: &DocumentChunk) -> HashMap<String, Value> {
        let meta = &chunk.metadata;
        let mut payload: HashMap<String, Value> = meta
            .custom
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect();

        payload.insert(PAYLOAD_INDEX.to_string(), (chunk.index as i64).into());
        payload.insert(PAYLOAD_CONTENT.to_string(), chunk.content.clone().into());
        payload.insert(
            PAYLOAD_DOCUMENT_ID.to_string(),
            meta.document_id.to_string().into(),
        );
        if let Some(ref name) = meta.file_name {
            payload.insert(PAYLOAD_FILE_NAME.to_string(), name.clone().into());
        }
        if let Some(ref path) = meta.file_path {
            payload.insert(PAYLOAD_FILE_PATH.to_string(), path.clone().into());
        }
        if let Some(page) = meta.page_number {
            payload.insert(PAYLOAD_PAGE_NUMBER.to_string(), i64::from(page).into());
        }

        payload
    }

    fn from_payload(payload: &HashMap<String, Value>) -> Option<DocumentChunk> {
        let index = payload.get(PAYLOAD_INDEX)?.as_integer()? as usize;
        let content = payload.get(PAYLOAD_CONTENT)?.as_str()?.to_string();
        let document_id = Uuid::parse_str(payload.get(PAYLOAD_DOCUMENT_ID)?.as_str()?).ok()?;

        let mut meta = DocumentMetadata::with_id(document_id);
        meta.file_name = payload
            .get(PAYLOAD_FILE_NAME)
            .and_then(|v| v.as_str())
            .cloned();
        meta.file_path = payload
            .get(PAYLOAD_FILE_PATH)
            .and_then(|v| v.as_str())
            .cloned();
        meta.page_number = payload
            .get(PAYLOAD_PAGE_NUMBER)
            .and_then(|v| v.as_integer())
            .map(|p| p as u32);

        let reserved = [
            PAYLOAD_INDEX,
            PAYLOAD_CONTENT,
            PAYLOAD_DOCUMENT_ID,
            PAYLOAD_FILE_NAME,
            PAYLOAD_FILE_PATH,
            PAYLOAD_PAGE_NUMBER,
        ];
        meta.custom = payload
            .iter()
            .filter(|(k, _)| !reserved.contains(&k.as_str()))
            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.clone())))
            .collect();

        Some(DocumentChunk::new(index, content, Arc::new(meta)))
    }

    fn to_point(id: PointId, chunk: &DocumentChunk, vector: &[f32]) -> PointStruct {
        PointStruct::new(point_id(id), vector.to_vec(), Self::to_payload(chunk))
    }

    /// Integer-valued payload fields are matched as integers, everything
    /// else as exact keywords.
    fn filter_conditions(filters: &HashMap<String, String>) -> Vec<Condition> {
        filters
            .iter()
            .map(|(field, value)| {
                let numeric = field == PAYLOAD_INDEX || field == PAYLOAD_PAGE_NUMBER;
                let match_value = match value.parse::<i64>() {
                    Ok(n) if numeric => MatchValue::Integer(n),
                    _ => MatchValue::Keyword(value.clone()),
                };
                let field_condition = FieldCondition {
                    key: field.clone(),
                    r#match: Some(Match {
                        match_value: Some(match_value),
                    }),
                    ..Default::default()
                };
                Condition {
                    condition_one_of: Some(ConditionOneOf::Field(field_condition)),
                }
            })
            .collect()
    }

    fn parse_point_id(id: &QdrantPointId) -> Option<PointId> {
        match id.point_id_options.as_ref()? {
            PointIdOptions::Uuid(uuid) => Uuid::parse_str(uuid).ok(),
            PointIdOptions::Num(_) => None,
        }
    }
}

// ============================================================================
// VectorStore Trait Implementation
// ============================================================================

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn provider_name(&self) -> &'static str {
        "qdrant"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.collection_exists(name).await? {
            return Ok(());
        }

        let created = self
            .client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(dimensions as u64, Distance::Cosine),
            ))
            .await;

        match created {
            Ok(_) => Ok(()),
            // Lost a creation race against another writer
            Err(e) if is_already_exists(&e.to_string()) => {
                tracing::debug!(collection = %name, "Collection created concurrently");
                Ok(())
            }
            Err(e) => Err(store_err("create collection")(e)),
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client
            .delete_collection(name)
            .await
            .map_err(store_err("delete collection"))?;
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(store_err("list collections"))?;

        Ok(collections
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn add(&self, collection: &str, chunk: &DocumentChunk, vector: &[f32]) -> Result<PointId> {
        let id = Uuid::new_v4();
        self.upsert(collection, id, chunk, vector).await?;
        Ok(id)
    }

    async fn add_range(
        &self,
        collection: &str,
        items: &[(DocumentChunk, Vec<f32>)],
    ) -> Result<Vec<PointId>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<PointId> = items.iter().map(|_| Uuid::new_v4()).collect();
        let points: Vec<PointStruct> = ids
            .iter()
            .zip(items)
            .map(|(id, (chunk, vector))| Self::to_point(*id, chunk, vector))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(store_err("upsert points"))?;

        Ok(ids)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: PointId,
        chunk: &DocumentChunk,
        vector: &[f32],
    ) -> Result<()> {
        let point = Self::to_point(id, chunk, vector);
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(store_err("upsert point"))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: PointId) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(vec![point_id(id)])
                    .wait(true),
            )
            .await
            .map_err(store_err("delete point"))?;
        Ok(())
    }

    async fn get_by_id(&self, collection: &str, id: PointId) -> Result<Option<DocumentChunk>> {
        let response = self
            .client
            .get_points(GetPointsBuilder::new(collection, vec![point_id(id)]).with_payload(true))
            .await
            .map_err(store_err("retrieve point"))?;

        Ok(response
            .result
            .iter()
            .find(|p| p.id.as_ref().and_then(Self::parse_point_id) == Some(id))
            .and_then(|p| Self::from_payload(&p.payload)))
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
        filters: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut search_builder =
            SearchPointsBuilder::new(collection, query.to_vec(), top_k as u64).with_payload(true);

        if let Some(filters) = filters.filter(|f| !f.is_empty()) {
            search_builder = search_builder.filter(Filter::must(Self::filter_conditions(filters)));
        }

        let response = self
            .client
            .search_points(search_builder)
            .await
            .map_err(store_err("search"))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let chunk = Self::from_payload(&point.payload)?;
                Some(ScoredChunk {
                    chunk,
                    score: point.score,
                })
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(store_err("count points"))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
