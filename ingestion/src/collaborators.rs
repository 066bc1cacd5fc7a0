//! Trait seams for the external collaborators this crate is driven by
//! (§1): the relational store, the embedding provider, and the audit
//! chain. Production wiring lives in `acp_core`; tests use in-memory
//! fakes.

use crate::error::IngestError;
use crate::types::{IngestJob, JobStatus, KnowledgeChunk};
use async_trait::async_trait;

/// The relational store's job-lifecycle slice (§3 `IngestJob` lifecycle,
/// §4.4 "transactionally acquire the job").
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: IngestJob) -> Result<(), IngestError>;
    async fn get(&self, id: &str) -> Result<Option<IngestJob>, IngestError>;
    /// Atomically transitions `id` from `Pending` to `Processing`, recording
    /// `started_at`. Returns the updated job, or `None` if it wasn't pending.
    async fn acquire(&self, id: &str) -> Result<Option<IngestJob>, IngestError>;
    async fn mark_completed(&self, id: &str, chunks_created: u64) -> Result<(), IngestError>;
    async fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), IngestError>;
    async fn retry(&self, id: &str) -> Result<IngestJob, IngestError>;
    async fn push_warning(&self, id: &str, message: &str) -> Result<(), IngestError>;
    async fn delete(&self, id: &str) -> Result<(), IngestError>;
    async fn list(
        &self,
        owner: Option<&str>,
        status: Option<JobStatus>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<IngestJob>, IngestError>;
}

/// The relational store's chunk slice. `(job_id, chunk_index)` is the
/// idempotency key the coordinator dedups against (§4.4 Idempotency).
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn exists(&self, job_id: &str, chunk_index: usize) -> Result<bool, IngestError>;
    async fn insert(&self, chunk: KnowledgeChunk) -> Result<(), IngestError>;
    async fn get(&self, id: &str) -> Result<Option<KnowledgeChunk>, IngestError>;
    async fn count_for_job(&self, job_id: &str) -> Result<u64, IngestError>;
    async fn delete(&self, id: &str) -> Result<(), IngestError>;
    async fn delete_by(&self, source_type: Option<&str>, origin: Option<&str>) -> Result<u64, IngestError>;
}

/// Opaque remote embedding endpoint (§1 Non-goals: the embedding provider
/// is a collaborator, not something this crate implements).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    fn model_id(&self) -> &str;
    fn version(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("transient embedding provider error: {0}")]
    Transient(String),
    #[error("permanent embedding provider error: {0}")]
    Permanent(String),
}

impl EmbeddingError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
