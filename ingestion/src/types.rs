//! Data model for one ingestion submission and the chunks it produces (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use doc_parsers::SourceType;

/// Access classification attached to every ingested artifact (Glossary:
/// Sensitivity). Ordered so `>` reflects "more restricted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl Sensitivity {
    /// The permission string the RBAC sensitivity access gate maps to
    /// (§3 `User / Role / Permission`). `Public` requires no permission.
    #[must_use]
    pub fn required_permission(self) -> Option<&'static str> {
        match self {
            Sensitivity::Public => None,
            Sensitivity::Internal => Some("data:view_sensitive"),
            Sensitivity::Confidential => Some("data:view_confidential"),
            Sensitivity::Restricted => Some("data:view_restricted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// One ingestion submission (§3 `IngestJob`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub id: String,
    pub source_type: SourceType,
    pub origin: String,
    pub sensitivity: Sensitivity,
    pub uploader: String,
    pub byte_size: u64,
    pub metadata: serde_json::Value,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub chunks_created: u64,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl IngestJob {
    #[must_use]
    pub fn new(
        source_type: SourceType,
        origin: impl Into<String>,
        sensitivity: Sensitivity,
        uploader: impl Into<String>,
        byte_size: u64,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_type,
            origin: origin.into(),
            sensitivity,
            uploader: uploader.into(),
            byte_size,
            metadata,
            status: JobStatus::Pending,
            error_message: None,
            chunks_created: 0,
            retry_count: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Pushes a warning message into `metadata.warnings` (§4.1 per-parser
    /// "skip with a warning" failure policies surface here).
    pub fn push_warning(&mut self, message: impl Into<String>) {
        let obj = self.metadata.as_object_mut().get_or_insert_with(Default::default);
        let entry = obj.entry("warnings").or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(arr) = entry {
            arr.push(serde_json::Value::String(message.into()));
        }
    }
}

/// One semantic unit persisted alongside its vector (§3 `KnowledgeChunk`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub job_id: Option<String>,
    pub source_type: SourceType,
    pub source_location: String,
    pub chunk_text: String,
    pub chunk_index: usize,
    pub metadata: serde_json::Value,
    pub embedding_model: String,
    pub embedding_version: String,
    pub vector_id: String,
    pub sensitive: bool,
    pub redacted: bool,
    pub pii_types: Vec<String>,
}
