//! Drives one job from `pending` to a terminal status (§4.4).
//!
//! ```text
//! acquire ─► parser.parse ─► for each ParsedDocument:
//!                               pii.process ─► chunker.chunk_text ─► for each Chunk:
//!                                     (dedup by job_id+chunk_index)
//!                                     embed (retried) ─► vector_index.add ─► chunk_store.insert
//! ```

use std::sync::Arc;

use chunker::prelude::ChunkerConfig;
use doc_parsers::{ParseOptions, ParserInput};
use futures::stream::{self, StreamExt};
use pii_guard::config::RedactionMode;
use pii_guard::detector::PiiDetector;
use vector_index::VectorIndex;

use crate::backoff::{retry_with_backoff, RetryPolicy};
use crate::collaborators::{ChunkStore, EmbeddingProvider, JobStore};
use crate::error::IngestError;
use crate::types::{JobStatus, KnowledgeChunk};

/// Upper bound on chunks embedded/upserted concurrently per job (§4.4
/// Backpressure, §5 "bounded work queue limits concurrent in-flight
/// chunks per job").
const DEFAULT_CHUNK_CONCURRENCY: usize = 8;

pub struct IngestionCoordinator {
    jobs: Arc<dyn JobStore>,
    chunks: Arc<dyn ChunkStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorIndex>,
    pii: Arc<PiiDetector>,
    pii_mode: RedactionMode,
    chunker_config: ChunkerConfig,
    audit: Arc<dyn audit_chain::chain::AuditChain>,
    chunk_concurrency: usize,
    retry_policy: RetryPolicy,
}

impl IngestionCoordinator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        chunks: Arc<dyn ChunkStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorIndex>,
        pii: Arc<PiiDetector>,
        pii_mode: RedactionMode,
        chunker_config: ChunkerConfig,
        audit: Arc<dyn audit_chain::chain::AuditChain>,
    ) -> Self {
        Self {
            jobs,
            chunks,
            embedder,
            vectors,
            pii,
            pii_mode,
            chunker_config,
            audit,
            chunk_concurrency: DEFAULT_CHUNK_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Runs the full per-job algorithm for `job_id` (§4.4 steps 1–5).
    ///
    /// # Errors
    /// Returns [`IngestError`] for any unrecoverable failure; the job's
    /// status has already been set to `Failed` with `error_message`
    /// populated by the time this returns `Err`.
    pub async fn process_job(&self, job_id: &str, input: ParserInput) -> Result<(), IngestError> {
        let Some(job) = self.jobs.acquire(job_id).await? else {
            let current = self.jobs.get(job_id).await?.ok_or_else(|| IngestError::NotFound(job_id.to_string()))?;
            return Err(IngestError::Conflict(job_id.to_string(), current.status));
        };

        match self.run_job(&job, input).await {
            Ok(chunks_created) => {
                self.jobs.mark_completed(job_id, chunks_created).await?;
                metrics::counter!("acp_jobs_processed_total", "status" => "completed").increment(1);
                self.audit
                    .append(
                        audit_chain::entry::NewAuditEntry::new("ingest.complete", audit_chain::entry::Severity::Low)
                            .with_resource("ingest_job", job_id),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => {
                self.jobs.mark_failed(job_id, &err.to_string()).await?;
                metrics::counter!("acp_jobs_processed_total", "status" => "failed").increment(1);
                let severity = if err.kind() == "XmlSecurityError" || err.kind() == "PathTraversalError" {
                    audit_chain::entry::Severity::High
                } else {
                    audit_chain::entry::Severity::Medium
                };
                self.audit
                    .append(
                        audit_chain::entry::NewAuditEntry::new("ingest.fail", severity)
                            .with_resource("ingest_job", job_id)
                            .with_details(serde_json::json!({"error": err.to_string()})),
                    )
                    .await?;
                if matches!(err.kind(), "XmlSecurityError" | "PathTraversalError") {
                    self.audit
                        .append(
                            audit_chain::entry::NewAuditEntry::new("security.violation", audit_chain::entry::Severity::High)
                                .with_resource("ingest_job", job_id)
                                .with_details(serde_json::json!({"error": err.to_string()})),
                        )
                        .await?;
                }
                Err(err)
            }
        }
    }

    async fn run_job(
        &self,
        job: &crate::types::IngestJob,
        input: ParserInput,
    ) -> Result<u64, IngestError> {
        let outcome = doc_parsers::parse(job.source_type, input, job.metadata.clone(), ParseOptions::default())
            .await
            .map_err(IngestError::Parse)?;

        for warning in outcome.warnings {
            self.jobs.push_warning(&job.id, &warning.message).await?;
        }

        let mut global_chunk_index = 0usize;
        let mut total_created = 0u64;

        for (doc_index, document) in outcome.documents.enumerate() {
            let processed = self
                .pii
                .process(&document.content, self.pii_mode)
                .await
                .map_err(IngestError::Pii)?;
            let pii_types: Vec<String> = self
                .pii
                .detect(&document.content)
                .await
                .map_err(IngestError::Pii)?
                .into_iter()
                .map(|m| m.entity_type.to_string())
                .collect();
            let sensitive = !pii_types.is_empty();

            let chunks = chunker::chunker::chunk_text(&processed, self.chunker_config).map_err(IngestError::Chunk)?;

            let job_id = job.id.clone();
            let source_type = job.source_type;
            let source_location = format!("{}#{}", document.title, doc_index);
            let metadata = document.metadata.clone();

            let results = stream::iter(chunks.into_iter().map(|chunk| {
                let chunk_index = global_chunk_index;
                global_chunk_index += 1;
                let job_id = job_id.clone();
                let source_location = source_location.clone();
                let metadata = metadata.clone();
                let pii_types = pii_types.clone();
                async move {
                    self.process_one_chunk(
                        &job_id,
                        source_type,
                        &source_location,
                        chunk_index,
                        chunk,
                        metadata,
                        sensitive,
                        pii_types,
                    )
                    .await
                }
            }))
            .buffered(self.chunk_concurrency)
            .collect::<Vec<_>>()
            .await;

            for result in results {
                if result? {
                    total_created += 1;
                }
            }
        }

        Ok(total_created)
    }

    /// Embeds, upserts, and persists one chunk. Returns `Ok(false)` if the
    /// chunk was already persisted by a prior attempt at this job (§4.4
    /// Idempotency) — the count that feeds `chunks_created` only advances
    /// on genuinely new inserts.
    #[allow(clippy::too_many_arguments)]
    async fn process_one_chunk(
        &self,
        job_id: &str,
        source_type: doc_parsers::SourceType,
        source_location: &str,
        chunk_index: usize,
        chunk: chunker::types::Chunk,
        doc_metadata: serde_json::Value,
        sensitive: bool,
        pii_types: Vec<String>,
    ) -> Result<bool, IngestError> {
        if self.chunks.exists(job_id, chunk_index).await? {
            return Ok(false);
        }

        let embedding = retry_with_backoff(
            self.retry_policy,
            crate::collaborators::EmbeddingError::is_transient,
            || self.embedder.embed(chunk.body()),
        )
        .await
        .map_err(|e| IngestError::DependencyExhausted {
            attempts: self.retry_policy.max_attempts,
            source: Box::new(e),
        })?;

        let mut metadata = doc_metadata;
        if let Some(obj) = metadata.as_object_mut() {
            obj.insert("chunk_index".into(), serde_json::json!(chunk.metadata.chunk_index));
            obj.insert("heading_title".into(), serde_json::json!(chunk.metadata.heading_title));
        }

        let vector_id = self
            .vectors
            .add(embedding, metadata.clone(), chunk.body().to_string())
            .await
            .map_err(IngestError::VectorIndex)?;

        let knowledge_chunk = KnowledgeChunk {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: Some(job_id.to_string()),
            source_type,
            source_location: source_location.to_string(),
            chunk_text: chunk.body().to_string(),
            chunk_index,
            metadata,
            embedding_model: self.embedder.model_id().to_string(),
            embedding_version: self.embedder.version().to_string(),
            vector_id: vector_id.clone(),
            sensitive,
            redacted: sensitive,
            pii_types,
        };

        if let Err(e) = self.chunks.insert(knowledge_chunk).await {
            // Compensating delete: the vector-index write succeeded but
            // the chunk row didn't, so undo the upsert (§5 "eventually
            // consistent ... compensating delete on chunk-insert failure").
            let _ = self.vectors.delete(&vector_id).await;
            return Err(e);
        }

        metrics::counter!("acp_chunks_created_total").increment(1);
        Ok(true)
    }
}
