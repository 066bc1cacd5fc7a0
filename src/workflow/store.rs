//! Persistence for [`WorkflowExecution`] records, mirroring `ingestion`'s
//! `JobStore`/`ChunkStore` split of a narrow async trait plus an
//! in-memory reference implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::WorkflowExecution;

#[derive(Debug, Error)]
pub enum WorkflowStoreError {
    #[error("workflow {0} not found")]
    NotFound(String),
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn put(&self, execution: WorkflowExecution) -> Result<(), WorkflowStoreError>;
    async fn get(&self, id: &str) -> Result<WorkflowExecution, WorkflowStoreError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkflowExecution>, WorkflowStoreError>;
}

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    executions: RwLock<HashMap<String, WorkflowExecution>>,
}

impl InMemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn put(&self, execution: WorkflowExecution) -> Result<(), WorkflowStoreError> {
        self.executions.write().await.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<WorkflowExecution, WorkflowStoreError> {
        self.executions.read().await.get(id).cloned().ok_or_else(|| WorkflowStoreError::NotFound(id.to_string()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkflowExecution>, WorkflowStoreError> {
        Ok(self.executions.read().await.values().filter(|w| w.user_id == user_id).cloned().collect())
    }
}
