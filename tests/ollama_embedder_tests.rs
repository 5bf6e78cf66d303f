//! Ollama embedder tests with mocked network responses
//!
//! These tests use wiremock to stand in for the Ollama `/api/embed` endpoint
//! and cover the request shape, error mapping, and use through the engine.

use raglib::rag::{Embedder, OllamaEmbedder, RagEngineBuilder};
use raglib::types::RagError;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

fn mock_embed_response(vectors: &[Vec<f32>]) -> serde_json::Value {
    json!({
        "model": "nomic-embed-text",
        "embeddings": vectors,
    })
}

fn embedder_for(server: &MockServer, dimensions: usize) -> OllamaEmbedder {
    OllamaEmbedder::new(server.uri(), "nomic-embed-text".to_string(), dimensions).unwrap()
}

// ============= Embedding Requests =============

#[tokio::test]
async fn test_embed_posts_model_and_input() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_json(json!({
            "model": "nomic-embed-text",
            "input": "hello world",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_embed_response(&[vec![0.1, 0.2, 0.3]])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedder = embedder_for(&mock_server, 3);
    let vector = embedder.embed("hello world").await.unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_embed_response(&[vec![1.0, 0.0]])),
        )
        .mount(&mock_server)
        .await;

    let embedder =
        OllamaEmbedder::new(format!("{}/", mock_server.uri()), "m".to_string(), 2).unwrap();
    assert_eq!(embedder.embed("x").await.unwrap(), vec![1.0, 0.0]);
}

// ============= Error Handling =============

#[tokio::test]
async fn test_server_error_maps_to_embedding_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let result = embedder_for(&mock_server, 3).embed("hello").await;
    match result {
        Err(RagError::Embedding(msg)) => assert!(msg.contains("model not loaded"), "{}", msg),
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_embeddings_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [] })))
        .mount(&mock_server)
        .await;

    let result = embedder_for(&mock_server, 3).embed("hello").await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = embedder_for(&mock_server, 3).embed("hello").await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn test_unexpected_dimensions_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_embed_response(&[vec![0.5; 4]])),
        )
        .mount(&mock_server)
        .await;

    let result = embedder_for(&mock_server, 3).embed("hello").await;
    match result {
        Err(RagError::Embedding(msg)) => assert!(msg.contains("4 dimensions"), "{}", msg),
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_maps_to_embedding_error() {
    let embedder = OllamaEmbedder::new("http://127.0.0.1:1".to_string(), "m".to_string(), 3).unwrap();
    let result = embedder.embed("hello").await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
}

// ============= Engine Integration =============

#[tokio::test]
async fn test_engine_ingest_and_retrieve_through_ollama() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_embed_response(&[vec![0.6, 0.8]])),
        )
        .mount(&mock_server)
        .await;

    let engine = RagEngineBuilder::new()
        .use_fixed_size_chunker(10)
        .use_ollama_embedder(mock_server.uri(), "nomic-embed-text", 2)
        .use_in_memory_store()
        .build()
        .unwrap();

    let stored = engine
        .ingest("docs", "abcdefghijklmnopqrstuvwxy", None)
        .await
        .unwrap();
    assert_eq!(stored, 3);

    let results = engine.retrieve("docs", "anything", None).await.unwrap();
    assert_eq!(results.len(), 3);
    // Identical vectors tie; the store keeps insertion order
    let indices: Vec<usize> = results.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}
