//! Ingestion/search failure modes (§7 taxonomy, scoped to this crate).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {0} is {1:?}, retry only applies to failed/completed jobs")]
    Conflict(String, crate::types::JobStatus),

    #[error("parser error: {0}")]
    Parse(#[from] doc_parsers::ParseError),

    #[error("pii detection error: {0}")]
    Pii(#[from] pii_guard::error::PiiError),

    #[error("chunking error: {0}")]
    Chunk(#[from] chunker::error::ChunkError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] vector_index::VectorIndexError),

    #[error("dependency unavailable after {attempts} attempts: {source}")]
    DependencyExhausted {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("audit chain error: {0}")]
    Audit(#[from] audit_chain::error::AuditError),

    #[error("relational store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Maps this error onto the §7 taxonomy kind used for HTTP status
    /// translation and security-event correlation at the service boundary.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "ValidationFailed",
            Self::NotFound(_) => "NotFound",
            Self::Conflict(..) => "Conflict",
            Self::Parse(doc_parsers::ParseError::XmlSecurity(_)) => "XmlSecurityError",
            Self::Parse(doc_parsers::ParseError::PathTraversal(_)) => "PathTraversalError",
            Self::Parse(_) | Self::Pii(_) | Self::Chunk(_) => "ValidationFailed",
            Self::VectorIndex(_) | Self::DependencyExhausted { .. } | Self::Store(_) => "DependencyError",
            Self::Audit(_) | Self::Internal(_) => "PersistentInternalError",
        }
    }
}
