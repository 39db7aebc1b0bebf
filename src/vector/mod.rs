//! Vector Index Boundary
//!
//! The index is an external collaborator: namespaced upsert, namespaced
//! top-k cosine search, namespace listing, and deletion. Each uploaded
//! document owns exactly one namespace (its `document_id`); no query ever
//! crosses namespaces.

mod http;
mod memory;

pub use http::HttpVectorIndex;
pub use memory::InMemoryVectorIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Index API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Call timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid embedding dimensions: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, VectorIndexError>;

/// Metadata persisted alongside every vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    pub filename: String,
    /// 1-based page within the originating file.
    pub page_number: u32,
    /// 0-based position within the document.
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_end: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct NamespaceStats {
    pub namespace: String,
    pub vector_count: usize,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records in a namespace.
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Top-k cosine search within one namespace, best first.
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize)
        -> Result<Vec<VectorMatch>>;

    /// All non-empty namespaces with their vector counts.
    async fn list_namespaces(&self) -> Result<Vec<NamespaceStats>>;

    /// Drop a namespace and everything in it.
    async fn delete_namespace(&self, namespace: &str) -> Result<()>;
}
