//! Typed façade over the external vector index service (§4.5).
//!
//! The vector index itself is an external collaborator (§1 Non-goals: "not
//! implementing a vector index from scratch"); this crate only defines the
//! [`VectorIndex`] trait every caller programs against, plus a SQLite-backed
//! reference implementation used in tests and single-node deployments.
//!
//! ```text
//! KnowledgeChunk + embedding ─► VectorIndex::add ─► vector_id
//!                query embedding ─► VectorIndex::search(k, threshold, filter) ─► [SearchHit]
//! ```

pub mod filter;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use filter::Filter;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("vector {0} not found")]
    NotFound(String),

    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("backend storage error: {0}")]
    Storage(String),
}

/// One stored vector plus the metadata/text it was indexed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
    pub text: String,
}

/// One hit returned from [`VectorIndex::search`] (§4.5 `search`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    /// `1 − distance` when the backend's native metric is cosine distance.
    pub similarity: f32,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// `stats()` response (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vectors: u64,
    pub collection_name: String,
    pub status: String,
}

/// The typed operations every backend must support (§4.5 Operations).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(
        &self,
        embedding: Vec<f32>,
        metadata: serde_json::Value,
        text: String,
    ) -> Result<String, VectorIndexError>;

    async fn add_batch(
        &self,
        items: Vec<(Vec<f32>, serde_json::Value, String)>,
    ) -> Result<Vec<String>, VectorIndexError>;

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        similarity_threshold: f32,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchHit>, VectorIndexError>;

    async fn get(&self, vector_id: &str) -> Result<Option<VectorRecord>, VectorIndexError>;

    async fn delete(&self, vector_id: &str) -> Result<bool, VectorIndexError>;

    async fn delete_by_filter(&self, filter: &Filter) -> Result<u64, VectorIndexError>;

    async fn stats(&self) -> Result<IndexStats, VectorIndexError>;
}
