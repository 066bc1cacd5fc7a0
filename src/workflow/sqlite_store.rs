//! Reference [`WorkflowStore`] backend over SQLite, following the same
//! "narrow trait, in-memory fake for tests, SQLite reference store for
//! everything else" shape as [`audit_chain::sqlite`] and
//! [`ingestion::sqlite_store`]. `id` and `user_id` are indexed columns;
//! the execution itself (steps, context, results) is stored as one JSON
//! blob since its shape is owned by [`super::types`], not this table.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::store::{WorkflowStore, WorkflowStoreError};
use super::types::WorkflowExecution;

pub struct SqliteWorkflowStore {
    pool: SqlitePool,
}

impl SqliteWorkflowStore {
    /// Opens (and migrates) a SQLite-backed workflow store at `url`.
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().max_connections(4).connect(url).await?;

        sqlx::query(
            "create table if not exists workflow_executions (
                id text primary key,
                user_id text not null,
                status text not null,
                execution text not null
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl WorkflowStore for SqliteWorkflowStore {
    async fn put(&self, execution: WorkflowExecution) -> Result<(), WorkflowStoreError> {
        let status = serde_json::to_value(execution.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        let blob = serde_json::to_string(&execution)
            .map_err(|e| WorkflowStoreError::NotFound(format!("serialize {}: {e}", execution.id)))?;

        sqlx::query(
            "insert into workflow_executions (id, user_id, status, execution) values (?1, ?2, ?3, ?4)
             on conflict(id) do update set user_id = excluded.user_id, status = excluded.status, execution = excluded.execution",
        )
        .bind(&execution.id)
        .bind(&execution.user_id)
        .bind(status)
        .bind(blob)
        .execute(&self.pool)
        .await
        .map_err(|e| WorkflowStoreError::NotFound(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<WorkflowExecution, WorkflowStoreError> {
        let row = sqlx::query("select execution from workflow_executions where id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WorkflowStoreError::NotFound(e.to_string()))?
            .ok_or_else(|| WorkflowStoreError::NotFound(id.to_string()))?;
        let blob: String = row.get("execution");
        serde_json::from_str(&blob).map_err(|e| WorkflowStoreError::NotFound(format!("deserialize {id}: {e}")))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkflowExecution>, WorkflowStoreError> {
        let rows = sqlx::query("select execution from workflow_executions where user_id = ?1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WorkflowStoreError::NotFound(e.to_string()))?;
        rows.iter()
            .map(|row| {
                let blob: String = row.get("execution");
                serde_json::from_str(&blob).map_err(|e| WorkflowStoreError::NotFound(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Priority, WorkflowType};

    #[tokio::test]
    async fn round_trips_an_execution() {
        let store = SqliteWorkflowStore::open("sqlite::memory:").await.unwrap();
        let exec = WorkflowExecution::new("wf-1", WorkflowType::Full, "u1", "do a thing", Priority::Normal);
        store.put(exec.clone()).await.unwrap();
        let fetched = store.get("wf-1").await.unwrap();
        assert_eq!(fetched.id, exec.id);
        assert_eq!(fetched.steps.len(), exec.steps.len());
    }

    #[tokio::test]
    async fn put_again_overwrites_in_place() {
        let store = SqliteWorkflowStore::open("sqlite::memory:").await.unwrap();
        let mut exec = WorkflowExecution::new("wf-1", WorkflowType::Full, "u1", "do a thing", Priority::Normal);
        store.put(exec.clone()).await.unwrap();
        exec.status = super::super::types::WorkflowStatus::Completed;
        store.put(exec.clone()).await.unwrap();
        let fetched = store.get("wf-1").await.unwrap();
        assert_eq!(fetched.status, super::super::types::WorkflowStatus::Completed);
    }

    #[tokio::test]
    async fn lists_only_a_users_own_workflows() {
        let store = SqliteWorkflowStore::open("sqlite::memory:").await.unwrap();
        store.put(WorkflowExecution::new("wf-1", WorkflowType::Full, "u1", "a", Priority::Normal)).await.unwrap();
        store.put(WorkflowExecution::new("wf-2", WorkflowType::Full, "u2", "b", Priority::Normal)).await.unwrap();
        let mine = store.list_for_user("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "wf-1");
    }
}
