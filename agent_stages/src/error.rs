//! Stage failure modes (§7 taxonomy, scoped to agent stage execution).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("llm response did not match the expected schema after a reformatting retry: {0}")]
    SchemaMismatch(String),

    #[error("llm provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("search collaborator error: {0}")]
    Search(#[from] ingestion::error::IngestError),

    #[error("audit chain error: {0}")]
    Audit(#[from] audit_chain::error::AuditError),
}

impl StageError {
    /// Maps onto the §7 taxonomy: schema mismatches and missing
    /// prerequisites are permanent (fail the workflow immediately); LLM
    /// provider errors may be transient and are retried by the workflow
    /// engine's stage-retry policy.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StageError::Llm(e) if e.is_transient())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transient llm provider error: {0}")]
    Transient(String),
    #[error("permanent llm provider error: {0}")]
    Permanent(String),
}

impl LlmError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
