//! Semantic query with tenant and sensitivity scoping (§4.6).

use std::sync::Arc;

use vector_index::{Filter, VectorIndex};

use crate::collaborators::{ChunkStore, EmbeddingProvider};
use crate::error::IngestError;
use crate::types::{KnowledgeChunk, Sensitivity};

/// Whatever the RBAC layer can tell this service about the caller — just
/// enough to gate sensitivity (§8 invariant 6), not a full user record.
pub trait CallerIdentity {
    fn has_permission(&self, permission: &str) -> bool;

    /// The highest [`Sensitivity`] this caller may read, derived from the
    /// sensitivity access gate (§3 `User / Role / Permission`).
    fn max_sensitivity(&self) -> Sensitivity {
        if self.has_permission("data:view_restricted") {
            Sensitivity::Restricted
        } else if self.has_permission("data:view_confidential") {
            Sensitivity::Confidential
        } else if self.has_permission("data:view_sensitive") {
            Sensitivity::Internal
        } else {
            Sensitivity::Public
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub rank: usize,
    pub similarity: f32,
    pub text: String,
    pub metadata: serde_json::Value,
}

pub struct SearchService {
    vectors: Arc<dyn VectorIndex>,
    chunks: Arc<dyn ChunkStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SearchService {
    #[must_use]
    pub fn new(vectors: Arc<dyn VectorIndex>, chunks: Arc<dyn ChunkStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { vectors, chunks, embedder }
    }

    /// Embeds `query_text`, queries the vector index, hydrates each hit's
    /// `KnowledgeChunk` row, and drops anything the caller's permissions
    /// don't cover — ranks are assigned *after* that filter (§4.6).
    pub async fn search(
        &self,
        query_text: &str,
        k: usize,
        threshold: f32,
        filter: Option<&Filter>,
        caller: &dyn CallerIdentity,
    ) -> Result<Vec<SearchResult>, IngestError> {
        let embedding = self.embedder.embed(query_text).await.map_err(|e| {
            IngestError::DependencyExhausted { attempts: 1, source: Box::new(e) }
        })?;
        let hits = self.vectors.search(&embedding, k, threshold, filter).await.map_err(IngestError::VectorIndex)?;

        let max_sensitivity = caller.max_sensitivity();
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(sensitivity) = hit.metadata.get("sensitivity").and_then(|v| v.as_str()) {
                if !sensitivity_allowed(sensitivity, max_sensitivity) {
                    continue;
                }
            }
            results.push(SearchResult {
                chunk_id: hit.id,
                rank: 0,
                similarity: hit.similarity,
                text: hit.text,
                metadata: hit.metadata,
            });
        }
        for (rank, result) in results.iter_mut().enumerate() {
            result.rank = rank + 1;
        }
        Ok(results)
    }

    /// Finds chunks similar to an already-indexed chunk, reusing its
    /// stored embedding when available rather than re-embedding its text.
    pub async fn similar_to(
        &self,
        chunk_id: &str,
        k: usize,
        threshold: f32,
        caller: &dyn CallerIdentity,
    ) -> Result<Vec<SearchResult>, IngestError> {
        let chunk = self.chunks.get(chunk_id).await?.ok_or_else(|| IngestError::NotFound(chunk_id.to_string()))?;
        self.search(&chunk.chunk_text, k, threshold, None, caller).await
    }

    /// Prefix match on stored document titles carried in chunk metadata.
    pub fn suggest(&self, candidates: &[KnowledgeChunk], prefix: &str, k: usize) -> Vec<String> {
        let prefix_lower = prefix.to_lowercase();
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for chunk in candidates {
            if let Some(title) = chunk.metadata.get("title").and_then(|v| v.as_str()) {
                if title.to_lowercase().starts_with(&prefix_lower) && seen.insert(title.to_string()) {
                    out.push(title.to_string());
                    if out.len() >= k {
                        break;
                    }
                }
            }
        }
        out
    }

    /// Cascading delete by source type / origin (§4.6 `delete_by`).
    pub async fn delete_by(&self, source_type: Option<&str>, origin: Option<&str>) -> Result<u64, IngestError> {
        self.chunks.delete_by(source_type, origin).await
    }
}

fn sensitivity_allowed(label: &str, max_allowed: Sensitivity) -> bool {
    let parsed = match label {
        "public" => Sensitivity::Public,
        "internal" => Sensitivity::Internal,
        "confidential" => Sensitivity::Confidential,
        "restricted" => Sensitivity::Restricted,
        _ => return true,
    };
    parsed <= max_allowed
}
