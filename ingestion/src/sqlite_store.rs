//! Reference [`JobStore`]/[`ChunkStore`] backend over SQLite (§3
//! `IngestJob`/`KnowledgeChunk`), mirroring `vector_index::sqlite`'s role:
//! a concrete relational store to run single-node deployments and tests
//! against, standing in for the production Postgres collaborator (§1).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::collaborators::{ChunkStore, JobStore};
use crate::error::IngestError;
use crate::types::{IngestJob, JobStatus, KnowledgeChunk, Sensitivity, SourceType};

fn source_type_str(s: SourceType) -> &'static str {
    match s {
        SourceType::TicketCsv => "ticket_csv",
        SourceType::WikiHtml => "wiki_html",
        SourceType::WikiXml => "wiki_xml",
        SourceType::Pdf => "pdf",
        SourceType::Markdown => "markdown",
        SourceType::Paste => "paste",
        SourceType::Code => "code",
        SourceType::DbSchema => "db_schema",
        SourceType::Zip => "zip",
        SourceType::Unknown => "unknown",
    }
}

fn parse_source_type(raw: &str) -> Result<SourceType, IngestError> {
    Ok(match raw {
        "ticket_csv" => SourceType::TicketCsv,
        "wiki_html" => SourceType::WikiHtml,
        "wiki_xml" => SourceType::WikiXml,
        "pdf" => SourceType::Pdf,
        "markdown" => SourceType::Markdown,
        "paste" => SourceType::Paste,
        "code" => SourceType::Code,
        "db_schema" => SourceType::DbSchema,
        "zip" => SourceType::Zip,
        _ => SourceType::Unknown,
    })
}

fn sensitivity_str(s: Sensitivity) -> &'static str {
    match s {
        Sensitivity::Public => "public",
        Sensitivity::Internal => "internal",
        Sensitivity::Confidential => "confidential",
        Sensitivity::Restricted => "restricted",
    }
}

fn parse_sensitivity(raw: &str) -> Result<Sensitivity, IngestError> {
    Ok(match raw {
        "public" => Sensitivity::Public,
        "internal" => Sensitivity::Internal,
        "confidential" => Sensitivity::Confidential,
        "restricted" => Sensitivity::Restricted,
        other => return Err(IngestError::Store(format!("unknown sensitivity {other} in ingest_jobs row"))),
    })
}

fn status_str(s: JobStatus) -> &'static str {
    match s {
        JobStatus::Pending => "pending",
        JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn parse_status(raw: &str) -> Result<JobStatus, IngestError> {
    Ok(match raw {
        "pending" => JobStatus::Pending,
        "processing" => JobStatus::Processing,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        "cancelled" => JobStatus::Cancelled,
        other => return Err(IngestError::Store(format!("unknown status {other} in ingest_jobs row"))),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IngestError::Store(e.to_string()))
}

/// SQLite-backed `ingest_jobs` table (§6 Persisted state layout).
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Opens (and migrates) a SQLite-backed job store at `url`.
    ///
    /// # Errors
    /// Returns [`IngestError::Store`] if the connection or schema
    /// migration fails.
    pub async fn open(url: &str) -> Result<Self, IngestError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        sqlx::query(
            "create table if not exists ingest_jobs (
                id text primary key,
                source_type text not null,
                origin text not null,
                sensitivity text not null,
                uploader text not null,
                byte_size integer not null,
                metadata text not null,
                status text not null,
                error_message text,
                chunks_created integer not null,
                retry_count integer not null,
                created_at text not null,
                started_at text,
                completed_at text
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;

        Ok(Self { pool })
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<IngestJob, IngestError> {
        Ok(IngestJob {
            id: row.get("id"),
            source_type: parse_source_type(&row.get::<String, _>("source_type"))?,
            origin: row.get("origin"),
            sensitivity: parse_sensitivity(&row.get::<String, _>("sensitivity"))?,
            uploader: row.get("uploader"),
            byte_size: row.get::<i64, _>("byte_size") as u64,
            metadata: serde_json::from_str(&row.get::<String, _>("metadata"))
                .map_err(|e| IngestError::Store(e.to_string()))?,
            status: parse_status(&row.get::<String, _>("status"))?,
            error_message: row.get("error_message"),
            chunks_created: row.get::<i64, _>("chunks_created") as u64,
            retry_count: row.get::<i64, _>("retry_count") as u32,
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            started_at: row.get::<Option<String>, _>("started_at").map(|s| parse_timestamp(&s)).transpose()?,
            completed_at: row.get::<Option<String>, _>("completed_at").map(|s| parse_timestamp(&s)).transpose()?,
        })
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: IngestJob) -> Result<(), IngestError> {
        let metadata = serde_json::to_string(&job.metadata).map_err(|e| IngestError::Store(e.to_string()))?;
        sqlx::query(
            "insert into ingest_jobs
                (id, source_type, origin, sensitivity, uploader, byte_size, metadata, status,
                 error_message, chunks_created, retry_count, created_at, started_at, completed_at)
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&job.id)
        .bind(source_type_str(job.source_type))
        .bind(&job.origin)
        .bind(sensitivity_str(job.sensitivity))
        .bind(&job.uploader)
        .bind(job.byte_size as i64)
        .bind(metadata)
        .bind(status_str(job.status))
        .bind(&job.error_message)
        .bind(job.chunks_created as i64)
        .bind(job.retry_count as i64)
        .bind(job.created_at.to_rfc3339())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<IngestJob>, IngestError> {
        let row = sqlx::query("select * from ingest_jobs where id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn acquire(&self, id: &str) -> Result<Option<IngestJob>, IngestError> {
        let mut tx = self.pool.begin().await.map_err(|e| IngestError::Store(e.to_string()))?;
        let row = sqlx::query("select * from ingest_jobs where id = ?1 and status = 'pending'")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let started_at = Utc::now();
        sqlx::query("update ingest_jobs set status = 'processing', started_at = ?1 where id = ?2")
            .bind(started_at.to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        tx.commit().await.map_err(|e| IngestError::Store(e.to_string()))?;

        let mut job = Self::row_to_job(&row)?;
        job.status = JobStatus::Processing;
        job.started_at = Some(started_at);
        Ok(Some(job))
    }

    async fn mark_completed(&self, id: &str, chunks_created: u64) -> Result<(), IngestError> {
        sqlx::query(
            "update ingest_jobs set status = 'completed', chunks_created = ?1, completed_at = ?2, error_message = null where id = ?3",
        )
        .bind(chunks_created as i64)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), IngestError> {
        sqlx::query("update ingest_jobs set status = 'failed', error_message = ?1, completed_at = ?2 where id = ?3")
            .bind(error_message)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn retry(&self, id: &str) -> Result<IngestJob, IngestError> {
        let mut tx = self.pool.begin().await.map_err(|e| IngestError::Store(e.to_string()))?;
        let row = sqlx::query("select * from ingest_jobs where id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        let job = Self::row_to_job(&row)?;
        if !matches!(job.status, JobStatus::Failed | JobStatus::Completed) {
            return Err(IngestError::Conflict(id.to_string(), job.status));
        }
        sqlx::query(
            "update ingest_jobs set status = 'pending', error_message = null, retry_count = retry_count + 1,
                started_at = null, completed_at = null where id = ?1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;
        tx.commit().await.map_err(|e| IngestError::Store(e.to_string()))?;

        let mut job = job;
        job.status = JobStatus::Pending;
        job.error_message = None;
        job.retry_count += 1;
        job.started_at = None;
        job.completed_at = None;
        Ok(job)
    }

    async fn push_warning(&self, id: &str, message: &str) -> Result<(), IngestError> {
        let mut job = self.get(id).await?.ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        job.push_warning(message);
        let metadata = serde_json::to_string(&job.metadata).map_err(|e| IngestError::Store(e.to_string()))?;
        sqlx::query("update ingest_jobs set metadata = ?1 where id = ?2")
            .bind(metadata)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn list(
        &self,
        owner: Option<&str>,
        status: Option<JobStatus>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<IngestJob>, IngestError> {
        let rows = sqlx::query("select * from ingest_jobs order by created_at desc")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        let mut jobs = rows.iter().map(Self::row_to_job).collect::<Result<Vec<_>, _>>()?;
        jobs.retain(|j| owner.is_none_or(|o| j.uploader == o) && status.is_none_or(|s| j.status == s));
        Ok(jobs.into_iter().skip(skip).take(limit).collect())
    }

    async fn delete(&self, id: &str) -> Result<(), IngestError> {
        let result = sqlx::query("delete from ingest_jobs where id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(IngestError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// SQLite-backed `knowledge_chunks` table.
pub struct SqliteChunkStore {
    pool: SqlitePool,
}

impl SqliteChunkStore {
    /// Opens (and migrates) a SQLite-backed chunk store at `url`. Callers
    /// typically share the same pool/url as [`SqliteJobStore`].
    ///
    /// # Errors
    /// Returns [`IngestError::Store`] if the connection or schema
    /// migration fails.
    pub async fn open(url: &str) -> Result<Self, IngestError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        sqlx::query(
            "create table if not exists knowledge_chunks (
                id text primary key,
                job_id text,
                source_type text not null,
                source_location text not null,
                chunk_text text not null,
                chunk_index integer not null,
                metadata text not null,
                embedding_model text not null,
                embedding_version text not null,
                vector_id text not null,
                sensitive integer not null,
                redacted integer not null,
                pii_types text not null
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;

        Ok(Self { pool })
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeChunk, IngestError> {
        Ok(KnowledgeChunk {
            id: row.get("id"),
            job_id: row.get("job_id"),
            source_type: parse_source_type(&row.get::<String, _>("source_type"))?,
            source_location: row.get("source_location"),
            chunk_text: row.get("chunk_text"),
            chunk_index: row.get::<i64, _>("chunk_index") as usize,
            metadata: serde_json::from_str(&row.get::<String, _>("metadata"))
                .map_err(|e| IngestError::Store(e.to_string()))?,
            embedding_model: row.get("embedding_model"),
            embedding_version: row.get("embedding_version"),
            vector_id: row.get("vector_id"),
            sensitive: row.get::<i64, _>("sensitive") != 0,
            redacted: row.get::<i64, _>("redacted") != 0,
            pii_types: serde_json::from_str(&row.get::<String, _>("pii_types"))
                .map_err(|e| IngestError::Store(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    async fn exists(&self, job_id: &str, chunk_index: usize) -> Result<bool, IngestError> {
        let row = sqlx::query("select 1 as present from knowledge_chunks where job_id = ?1 and chunk_index = ?2")
            .bind(job_id)
            .bind(chunk_index as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn insert(&self, chunk: KnowledgeChunk) -> Result<(), IngestError> {
        let metadata = serde_json::to_string(&chunk.metadata).map_err(|e| IngestError::Store(e.to_string()))?;
        let pii_types = serde_json::to_string(&chunk.pii_types).map_err(|e| IngestError::Store(e.to_string()))?;
        sqlx::query(
            "insert into knowledge_chunks
                (id, job_id, source_type, source_location, chunk_text, chunk_index, metadata,
                 embedding_model, embedding_version, vector_id, sensitive, redacted, pii_types)
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&chunk.id)
        .bind(&chunk.job_id)
        .bind(source_type_str(chunk.source_type))
        .bind(&chunk.source_location)
        .bind(&chunk.chunk_text)
        .bind(chunk.chunk_index as i64)
        .bind(metadata)
        .bind(&chunk.embedding_model)
        .bind(&chunk.embedding_version)
        .bind(&chunk.vector_id)
        .bind(chunk.sensitive as i64)
        .bind(chunk.redacted as i64)
        .bind(pii_types)
        .execute(&self.pool)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeChunk>, IngestError> {
        let row = sqlx::query("select * from knowledge_chunks where id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        row.as_ref().map(Self::row_to_chunk).transpose()
    }

    async fn count_for_job(&self, job_id: &str) -> Result<u64, IngestError> {
        let row = sqlx::query("select count(*) as count from knowledge_chunks where job_id = ?1")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn delete(&self, id: &str) -> Result<(), IngestError> {
        sqlx::query("delete from knowledge_chunks where id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete_by(&self, source_type: Option<&str>, origin: Option<&str>) -> Result<u64, IngestError> {
        // `origin` lives in chunk metadata (carried from the job), not a
        // dedicated column, so filter in application code once loaded.
        let rows = sqlx::query("select * from knowledge_chunks")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let mut deleted = 0u64;
        for row in &rows {
            let chunk = Self::row_to_chunk(row)?;
            let matches_source = source_type.is_none_or(|s| source_type_str(chunk.source_type) == s);
            let matches_origin = origin.is_none_or(|o| chunk.metadata.get("origin").and_then(|v| v.as_str()) == Some(o));
            if matches_source && matches_origin {
                self.delete(&chunk.id).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_round_trips_through_sqlite() {
        let store = SqliteJobStore::open("sqlite::memory:").await.unwrap();
        let job = IngestJob::new(SourceType::TicketCsv, "acme", Sensitivity::Internal, "u1", 100, serde_json::json!({}));
        let id = job.id.clone();
        store.insert(job).await.unwrap();

        let acquired = store.acquire(&id).await.unwrap().unwrap();
        assert_eq!(acquired.status, JobStatus::Processing);

        store.mark_completed(&id, 3).await.unwrap();
        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.chunks_created, 3);
    }

    #[tokio::test]
    async fn retry_resets_status_and_clears_error() {
        let store = SqliteJobStore::open("sqlite::memory:").await.unwrap();
        let job = IngestJob::new(SourceType::Markdown, "acme", Sensitivity::Public, "u1", 10, serde_json::json!({}));
        let id = job.id.clone();
        store.insert(job).await.unwrap();
        store.acquire(&id).await.unwrap();
        store.mark_failed(&id, "boom").await.unwrap();

        let retried = store.retry(&id).await.unwrap();
        assert_eq!(retried.status, JobStatus::Pending);
        assert!(retried.error_message.is_none());
        assert_eq!(retried.retry_count, 1);
    }

    #[tokio::test]
    async fn chunk_dedup_by_job_and_index() {
        let store = SqliteChunkStore::open("sqlite::memory:").await.unwrap();
        let chunk = KnowledgeChunk {
            id: "c1".into(),
            job_id: Some("job-1".into()),
            source_type: SourceType::Markdown,
            source_location: "doc#0".into(),
            chunk_text: "hello".into(),
            chunk_index: 0,
            metadata: serde_json::json!({}),
            embedding_model: "m".into(),
            embedding_version: "v1".into(),
            vector_id: "vec-1".into(),
            sensitive: false,
            redacted: false,
            pii_types: Vec::new(),
        };
        assert!(!store.exists("job-1", 0).await.unwrap());
        store.insert(chunk).await.unwrap();
        assert!(store.exists("job-1", 0).await.unwrap());
        assert_eq!(store.count_for_job("job-1").await.unwrap(), 1);
    }
}
