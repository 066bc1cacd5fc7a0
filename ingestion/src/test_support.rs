//! In-memory collaborator fakes shared by this crate's unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborators::{ChunkStore, EmbeddingError, EmbeddingProvider, JobStore};
use crate::error::IngestError;
use crate::types::{IngestJob, JobStatus, KnowledgeChunk};

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<Vec<IngestJob>>,
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: IngestJob) -> Result<(), IngestError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<IngestJob>, IngestError> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn acquire(&self, id: &str) -> Result<Option<IngestJob>, IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let Some(job) = guard.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        if job.status != JobStatus::Pending {
            return Ok(None);
        }
        job.status = JobStatus::Processing;
        job.started_at = Some(chrono::Utc::now());
        Ok(Some(job.clone()))
    }

    async fn mark_completed(&self, id: &str, chunks_created: u64) -> Result<(), IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let job = guard.iter_mut().find(|j| j.id == id).ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        job.status = JobStatus::Completed;
        job.chunks_created = chunks_created;
        job.completed_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let job = guard.iter_mut().find(|j| j.id == id).ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        job.status = JobStatus::Failed;
        job.error_message = Some(error_message.to_string());
        Ok(())
    }

    async fn retry(&self, id: &str) -> Result<IngestJob, IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let job = guard.iter_mut().find(|j| j.id == id).ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        job.status = JobStatus::Pending;
        job.retry_count += 1;
        job.error_message = None;
        Ok(job.clone())
    }

    async fn push_warning(&self, id: &str, message: &str) -> Result<(), IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let job = guard.iter_mut().find(|j| j.id == id).ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        job.push_warning(message);
        Ok(())
    }

    async fn list(
        &self,
        owner: Option<&str>,
        status: Option<JobStatus>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<IngestJob>, IngestError> {
        let guard = self.jobs.lock().unwrap();
        let filtered: Vec<IngestJob> = guard
            .iter()
            .filter(|j| owner.is_none_or(|o| j.uploader == o))
            .filter(|j| status.is_none_or(|s| j.status == s))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn delete(&self, id: &str) -> Result<(), IngestError> {
        let mut guard = self.jobs.lock().unwrap();
        let before = guard.len();
        guard.retain(|j| j.id != id);
        if guard.len() == before {
            return Err(IngestError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: Mutex<Vec<KnowledgeChunk>>,
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn exists(&self, job_id: &str, chunk_index: usize) -> Result<bool, IngestError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.job_id.as_deref() == Some(job_id) && c.chunk_index == chunk_index))
    }

    async fn insert(&self, chunk: KnowledgeChunk) -> Result<(), IngestError> {
        self.chunks.lock().unwrap().push(chunk);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeChunk>, IngestError> {
        Ok(self.chunks.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn count_for_job(&self, job_id: &str) -> Result<u64, IngestError> {
        Ok(self.chunks.lock().unwrap().iter().filter(|c| c.job_id.as_deref() == Some(job_id)).count() as u64)
    }

    async fn delete(&self, id: &str) -> Result<(), IngestError> {
        self.chunks.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn delete_by(&self, source_type: Option<&str>, origin: Option<&str>) -> Result<u64, IngestError> {
        let mut guard = self.chunks.lock().unwrap();
        let before = guard.len();
        guard.retain(|c| {
            let type_matches = source_type.is_none_or(|t| c.source_type.to_string() == t);
            let origin_matches = origin.is_none_or(|o| c.source_location.contains(o));
            !(type_matches && origin_matches)
        });
        Ok((before - guard.len()) as u64)
    }
}

/// Embeds deterministically (length-derived) and fails transiently the
/// first `fail_times` calls, to exercise the coordinator's retry path.
pub struct FlakyEmbeddingProvider {
    fail_times: u32,
    calls: AtomicU32,
}

impl FlakyEmbeddingProvider {
    #[must_use]
    pub fn new(fail_times: u32) -> Self {
        Self { fail_times, calls: AtomicU32::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            return Err(EmbeddingError::Transient("simulated outage".into()));
        }
        Ok(vec![text.len() as f32, 0.0, 0.0])
    }

    fn model_id(&self) -> &str {
        "fake-embedder"
    }

    fn version(&self) -> &str {
        "test"
    }
}
