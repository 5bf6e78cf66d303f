//! Vector stores.
//!
//! # Vector Store Providers
//!
//! - `memory` (default) - process-local store, always available
//! - `qdrant` - High-performance vector search engine
//!
//! Enable providers via Cargo features:
//! ```toml
//! raglib = { version = "*", features = ["qdrant"] }
//! ```

// Vector store abstraction layer
pub mod vectorstore;

// Provider implementations
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use vectorstore::{InMemoryVectorStore, VectorStore, VectorStoreProvider};

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
