//! TOML configuration for the engine and the `raglib` binary.
//!
//! ```toml
//! [chunker]
//! strategy = "sentence"
//! chunk_size = 500
//! chunk_overlap = 100
//! min_chunk_size = 200
//!
//! [embedder]
//! provider = "hashing"
//! dimensions = 384
//!
//! [vector_store]
//! provider = "memory"
//!
//! [query]
//! top_k = 3
//! timeout_secs = 30
//! ```
//!
//! Every section and field is optional.

use crate::db::VectorStoreProvider;
use crate::rag::chunker::ChunkingStrategy;
use crate::rag::embeddings::EmbedderProvider;
use crate::types::{ChunkerOptions, RagError, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunker: ChunkerConfig,
    pub embedder: EmbedderProvider,
    pub vector_store: VectorStoreProvider,
    pub query: QueryConfig,
}

/// `[chunker]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub strategy: ChunkingStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

impl ChunkerConfig {
    pub fn options(&self) -> ChunkerOptions {
        ChunkerOptions::new(self.chunk_size, self.chunk_overlap, self.min_chunk_size)
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        let options = ChunkerOptions::default();
        Self {
            strategy: ChunkingStrategy::default(),
            chunk_size: options.chunk_size,
            chunk_overlap: options.chunk_overlap,
            min_chunk_size: options.min_chunk_size,
        }
    }
}

/// `[query]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub top_k: usize,
    /// Per-call deadline for embedder and store requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            timeout_secs: None,
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for RagError {
    fn from(err: ConfigError) -> Self {
        RagError::Configuration(err.to_string())
    }
}

impl FromStr for RagConfig {
    type Err = ConfigError;

    /// Parse without validating.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

impl RagConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: RagConfig = content.parse()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // min_chunk_size only constrains the sentence-aware chunker
        let chunker_check = match self.chunker.strategy {
            ChunkingStrategy::Sentence => self.chunker.options().validate(),
            ChunkingStrategy::Fixed => ChunkerOptions {
                min_chunk_size: 0,
                ..self.chunker.options()
            }
            .validate(),
        };
        chunker_check.map_err(|e| ConfigError::ValidationError(format!("[chunker] {}", e)))?;

        if self.query.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "[query] top_k must be greater than zero".to_string(),
            ));
        }
        if self.query.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "[query] timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.embedder.dimensions() == 0 {
            return Err(ConfigError::ValidationError(
                "[embedder] dimensions must be greater than zero".to_string(),
            ));
        }

        self.validate_vector_store()?;

        Ok(())
    }

    #[cfg(feature = "qdrant")]
    fn validate_vector_store(&self) -> Result<(), ConfigError> {
        if let VectorStoreProvider::Qdrant {
            api_key_env: Some(ref name),
            ..
        } = self.vector_store
        {
            std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.clone()))?;
        }
        Ok(())
    }

    #[cfg(not(feature = "qdrant"))]
    fn validate_vector_store(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: RagConfig = "".parse().unwrap();

        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunker.strategy, ChunkingStrategy::Sentence);
        assert_eq!(config.chunker.options(), ChunkerOptions::default());
        assert_eq!(config.embedder.dimensions(), 384);
        assert_eq!(config.vector_store, VectorStoreProvider::Memory);
        assert_eq!(config.query.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[chunker]
strategy = "fixed"
chunk_size = 64
chunk_overlap = 8
min_chunk_size = 4

[embedder]
provider = "ollama"
url = "http://gpu-box:11434"
model = "mxbai-embed-large"
dimensions = 1024

[vector_store]
provider = "memory"

[query]
top_k = 5
timeout_secs = 10
"#;
        let config: RagConfig = content.parse().unwrap();

        assert_eq!(config.chunker.strategy, ChunkingStrategy::Fixed);
        assert_eq!(config.chunker.options(), ChunkerOptions::new(64, 8, 4));
        assert_eq!(
            config.embedder,
            EmbedderProvider::Ollama {
                url: "http://gpu-box:11434".to_string(),
                model: "mxbai-embed-large".to_string(),
                dimensions: 1024,
            }
        );
        assert_eq!(config.query.top_k, 5);
        assert_eq!(config.query.timeout_secs, Some(10));
    }

    #[test]
    fn test_load_missing_file() {
        let result = RagConfig::load("/definitely/not/here/raglib.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let file = write_config("[chunker\nchunk_size = 1");
        assert!(matches!(
            RagConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_validates() {
        let file = write_config("[chunker]\nchunk_size = 100\nmin_chunk_size = 150\n");
        let result = RagConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("min_chunk_size")));

        let file = write_config("[chunker]\nchunk_size = 100\nmin_chunk_size = 50\n");
        let config = RagConfig::load(file.path()).unwrap();
        assert_eq!(config.chunker.chunk_size, 100);
    }

    #[test]
    fn test_fixed_strategy_ignores_min_chunk_size() {
        let mut config = RagConfig::default();
        config.chunker.strategy = ChunkingStrategy::Fixed;
        config.chunker.chunk_size = 64;
        assert!(config.validate().is_ok());

        config.chunker.strategy = ChunkingStrategy::Sentence;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = RagConfig::default();
        config.query.top_k = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = RagConfig::default();
        config.chunker.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = RagConfig::default();
        config.embedder = EmbedderProvider::Hashing { dimensions: 0 };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = RagConfig::default();
        config.query.timeout_secs = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_provider_is_a_parse_error() {
        let result: Result<RagConfig, _> = "[vector_store]\nprovider = \"faiss\"\n".parse();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[cfg(feature = "qdrant")]
    #[test]
    fn test_validation_requires_api_key_env() {
        let config: RagConfig = r#"
[vector_store]
provider = "qdrant"
url = "http://localhost:6334"
api_key_env = "RAGLIB_TEST_UNSET_QDRANT_KEY"
"#
        .parse()
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "RAGLIB_TEST_UNSET_QDRANT_KEY"
        ));
    }

    #[test]
    fn test_config_error_converts_to_configuration() {
        let err: RagError = ConfigError::ValidationError("bad".to_string()).into();
        assert!(matches!(err, RagError::Configuration(msg) if msg.contains("bad")));
    }
}
