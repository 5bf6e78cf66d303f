//! Text embedding backends.
//!
//! The engine only depends on the [`Embedder`] trait. Two implementations
//! ship with the crate:
//!
//! - [`HashingEmbedder`] - offline feature hashing over lowercase word
//!   tokens. Deterministic across runs, no model download, useful for tests
//!   and local experiments.
//! - [`OllamaEmbedder`] - calls a running Ollama server (`POST /api/embed`).

use crate::types::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Maps one text to one fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Length of every vector this embedder returns. Used as the dimension
    /// of collections created on its behalf.
    fn dimensions(&self) -> usize;

    /// Embed `text`.
    ///
    /// # Errors
    ///
    /// [`RagError::Embedding`] when the backend produces no usable vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

// ============================================================================
// Provider Configuration
// ============================================================================

fn default_dimensions() -> usize {
    384
}

fn default_ollama_url() -> String {
    std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

fn default_ollama_model() -> String {
    "nomic-embed-text".to_string()
}

/// Embedding backend selectable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbedderProvider {
    /// Offline feature-hashing embedder.
    Hashing {
        #[serde(default = "default_dimensions")]
        dimensions: usize,
    },

    /// Ollama embedding endpoint.
    Ollama {
        #[serde(default = "default_ollama_url")]
        url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_dimensions")]
        dimensions: usize,
    },
}

impl Default for EmbedderProvider {
    fn default() -> Self {
        EmbedderProvider::Hashing {
            dimensions: default_dimensions(),
        }
    }
}

impl EmbedderProvider {
    pub fn dimensions(&self) -> usize {
        match self {
            EmbedderProvider::Hashing { dimensions } => *dimensions,
            EmbedderProvider::Ollama { dimensions, .. } => *dimensions,
        }
    }

    /// Instantiate the configured embedder.
    pub fn create_embedder(&self) -> Result<Arc<dyn Embedder>> {
        Ok(match self {
            EmbedderProvider::Hashing { dimensions } => Arc::new(HashingEmbedder::new(*dimensions)?),
            EmbedderProvider::Ollama {
                url,
                model,
                dimensions,
            } => Arc::new(OllamaEmbedder::new(url.clone(), model.clone(), *dimensions)?),
        })
    }
}

fn ensure_dimensions(dimensions: usize) -> Result<()> {
    if dimensions == 0 {
        return Err(RagError::Configuration(
            "Embedding dimensions must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Hashing Embedder
// ============================================================================

/// Bag-of-words embedder using SHA-256 feature hashing.
///
/// Each lowercase alphanumeric token is hashed to a bucket and a sign; the
/// resulting vector is L2-normalised, so cosine similarity reflects shared
/// vocabulary. Text without tokens embeds to the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        ensure_dimensions(dimensions)?;
        Ok(Self { dimensions })
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (bucket, sign) = self.bucket(&token.to_lowercase());
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(vector)
    }
}

// ============================================================================
// Ollama Embedder
// ============================================================================

/// Embedder backed by an Ollama server.
pub struct OllamaEmbedder {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, dimensions: usize) -> Result<Self> {
        ensure_dimensions(dimensions)?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama request failed ({}): {}",
                status, text
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse response: {}", e)))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RagError::Embedding("No embeddings found in the response".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(RagError::Embedding(format!(
                "Model '{}' returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }
}
