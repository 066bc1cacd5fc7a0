//! Error taxonomy for the audit chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to canonicalize audit entry: {0}")]
    Canonicalization(#[from] serde_json::Error),

    #[error("audit store backend failure: {0}")]
    Store(String),
}
