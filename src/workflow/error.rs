//! Error taxonomy for workflow execution (§7), distinguishing permanent
//! failures from the transient dependency errors the retry policy covers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow {0} not found")]
    NotFound(String),

    #[error("workflow {0} is not waiting for input (status: {1:?})")]
    NotWaitingForInput(String, crate::workflow::types::WorkflowStatus),

    #[error("answer submission references unknown question id {0}")]
    UnknownQuestionId(String),

    #[error("stage error: {0}")]
    Stage(#[from] agent_stages::prelude::StageError),

    #[error("workflow graph execution error: {0}")]
    Runner(String),

    #[error("per-stage timeout exceeded for stage {stage}")]
    StageTimeout { stage: String },

    #[error("workflow exceeded its overall timeout")]
    WorkflowTimeout,

    #[error("concurrency cap reached; workflow queued")]
    ConcurrencyCapReached,
}

impl WorkflowError {
    /// Whether this error should be retried with backoff (§7
    /// `DependencyError`) versus failing the workflow immediately (§7
    /// permanent errors: schema mismatch, missing prerequisite).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, WorkflowError::Stage(e) if e.is_transient())
    }
}
