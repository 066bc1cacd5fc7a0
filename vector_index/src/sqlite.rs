//! Reference [`VectorIndex`] backend over SQLite, used in tests and
//! single-node deployments. Production deployments point at the real
//! external vector service instead; this backend exists so the rest of
//! the pipeline has something concrete to run against without one.
//!
//! Similarity search is brute-force cosine similarity in application code
//! rather than a native ANN index — acceptable for the corpus sizes this
//! backend is meant for (tests, small on-prem installs).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::filter::Filter;
use crate::{IndexStats, SearchHit, VectorIndex, VectorIndexError, VectorRecord};

pub struct SqliteVectorIndex {
    pool: SqlitePool,
    collection_name: String,
}

impl SqliteVectorIndex {
    /// Opens (and migrates) a SQLite-backed index at `url`, e.g.
    /// `sqlite://vectors.db` or `sqlite::memory:`.
    ///
    /// # Errors
    /// Returns [`VectorIndexError::Storage`] if the connection or schema
    /// migration fails.
    pub async fn open(url: &str, collection_name: impl Into<String>) -> Result<Self, VectorIndexError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;

        sqlx::query(
            "create table if not exists vectors (
                id text primary key,
                embedding text not null,
                metadata text not null,
                content text not null
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| VectorIndexError::Storage(e.to_string()))?;

        Ok(Self { pool, collection_name: collection_name.into() })
    }

    async fn insert_one(
        &self,
        id: &str,
        embedding: &[f32],
        metadata: &Value,
        text: &str,
    ) -> Result<(), VectorIndexError> {
        let embedding_json = serde_json::to_string(embedding)
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        sqlx::query("insert into vectors (id, embedding, metadata, content) values (?1, ?2, ?3, ?4)")
            .bind(id)
            .bind(embedding_json)
            .bind(metadata_json)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<VectorRecord>, VectorIndexError> {
        let rows = sqlx::query("select id, embedding, metadata, content from vectors")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let embedding: Vec<f32> = serde_json::from_str(row.get::<String, _>("embedding").as_str())
                    .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
                let metadata: Value = serde_json::from_str(row.get::<String, _>("metadata").as_str())
                    .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
                Ok(VectorRecord {
                    id: row.get("id"),
                    embedding,
                    metadata,
                    text: row.get("content"),
                })
            })
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn add(
        &self,
        embedding: Vec<f32>,
        metadata: Value,
        text: String,
    ) -> Result<String, VectorIndexError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_one(&id, &embedding, &metadata, &text).await?;
        Ok(id)
    }

    async fn add_batch(
        &self,
        items: Vec<(Vec<f32>, Value, String)>,
    ) -> Result<Vec<String>, VectorIndexError> {
        let mut ids = Vec::with_capacity(items.len());
        for (embedding, metadata, text) in items {
            ids.push(self.add(embedding, metadata, text).await?);
        }
        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        similarity_threshold: f32,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        let records = self.load_all().await?;
        let mut scored: Vec<SearchHit> = records
            .into_iter()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| SearchHit {
                similarity: cosine_similarity(query_embedding, &r.embedding),
                id: r.id,
                text: r.text,
                metadata: r.metadata,
            })
            .filter(|hit| hit.similarity >= similarity_threshold)
            .collect();

        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn get(&self, vector_id: &str) -> Result<Option<VectorRecord>, VectorIndexError> {
        let row = sqlx::query("select id, embedding, metadata, content from vectors where id = ?1")
            .bind(vector_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        let Some(row) = row else { return Ok(None) };
        let embedding: Vec<f32> = serde_json::from_str(row.get::<String, _>("embedding").as_str())
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        let metadata: Value = serde_json::from_str(row.get::<String, _>("metadata").as_str())
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        Ok(Some(VectorRecord { id: row.get("id"), embedding, metadata, text: row.get("content") }))
    }

    async fn delete(&self, vector_id: &str) -> Result<bool, VectorIndexError> {
        let result = sqlx::query("delete from vectors where id = ?1")
            .bind(vector_id)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_filter(&self, filter: &Filter) -> Result<u64, VectorIndexError> {
        let records = self.load_all().await?;
        let mut count = 0u64;
        for record in records {
            if filter.matches(&record.metadata) && self.delete(&record.id).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn stats(&self) -> Result<IndexStats, VectorIndexError> {
        let row = sqlx::query("select count(*) as count from vectors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VectorIndexError::Storage(e.to_string()))?;
        let total_vectors: i64 = row.get("count");
        Ok(IndexStats {
            total_vectors: total_vectors as u64,
            collection_name: self.collection_name.clone(),
            status: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn index() -> SqliteVectorIndex {
        SqliteVectorIndex::open("sqlite::memory:", "test_collection").await.unwrap()
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let idx = index().await;
        let id = idx.add(vec![1.0, 0.0], json!({"origin": "acme"}), "hello".into()).await.unwrap();
        let record = idx.get(&id).await.unwrap().unwrap();
        assert_eq!(record.text, "hello");
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_respects_threshold() {
        let idx = index().await;
        idx.add(vec![1.0, 0.0], json!({}), "aligned".into()).await.unwrap();
        idx.add(vec![0.0, 1.0], json!({}), "orthogonal".into()).await.unwrap();

        let hits = idx.search(&[1.0, 0.0], 10, 0.5, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "aligned");
    }

    #[tokio::test]
    async fn search_applies_metadata_filter() {
        let idx = index().await;
        idx.add(vec![1.0, 0.0], json!({"sensitivity": "internal"}), "a".into()).await.unwrap();
        idx.add(vec![1.0, 0.0], json!({"sensitivity": "confidential"}), "b".into()).await.unwrap();

        let filter = Filter::new().eq("sensitivity", "internal");
        let hits = idx.search(&[1.0, 0.0], 10, 0.0, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "a");
    }

    #[tokio::test]
    async fn delete_removes_vector() {
        let idx = index().await;
        let id = idx.add(vec![1.0], json!({}), "x".into()).await.unwrap();
        assert!(idx.delete(&id).await.unwrap());
        assert!(idx.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_filter_cascades() {
        let idx = index().await;
        idx.add(vec![1.0], json!({"origin": "acme"}), "a".into()).await.unwrap();
        idx.add(vec![1.0], json!({"origin": "other"}), "b".into()).await.unwrap();
        let deleted = idx.delete_by_filter(&Filter::new().eq("origin", "acme")).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(idx.stats().await.unwrap().total_vectors, 1);
    }
}
