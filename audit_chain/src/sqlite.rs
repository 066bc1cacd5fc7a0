//! Reference [`AuditChain`] backend over SQLite, mirroring
//! `vector_index::sqlite`'s shape: a concrete store to run the rest of the
//! pipeline against when the relational store collaborator (§1) is a
//! single-node SQLite database rather than the production Postgres
//! deployment.
//!
//! `append` loads the latest row's hash and inserts the new row in one
//! transaction so two concurrent appends can never observe the same
//! "latest hash" and silently fork the chain (§4.9 Append, §5 "every
//! status transition is a transactional update").

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::chain::AuditChain;
use crate::entry::{canonical_json, compute_hash, AuditLogEntry, NewAuditEntry, Severity};
use crate::error::AuditError;

pub struct SqliteAuditChain {
    pool: SqlitePool,
}

impl SqliteAuditChain {
    /// Opens (and migrates) a SQLite-backed audit log at `url`.
    ///
    /// # Errors
    /// Returns [`AuditError::Store`] if the connection or schema migration
    /// fails.
    pub async fn open(url: &str) -> Result<Self, AuditError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| AuditError::Store(e.to_string()))?;

        sqlx::query(
            "create table if not exists audit_logs (
                id integer primary key autoincrement,
                action text not null,
                user_id text,
                resource_type text,
                resource_id text,
                details text not null,
                severity text not null,
                client_origin text,
                client_agent text,
                timestamp text not null,
                previous_hash text,
                hash text not null
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AuditError::Store(e.to_string()))?;

        Ok(Self { pool })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<AuditLogEntry, AuditError> {
        let severity_str: String = row.get("severity");
        let severity = match severity_str.as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            other => return Err(AuditError::Store(format!("unknown severity {other} in audit_logs row"))),
        };
        let timestamp: String = row.get("timestamp");
        Ok(AuditLogEntry {
            id: row.get::<i64, _>("id") as u64,
            action: row.get("action"),
            user_id: row.get("user_id"),
            resource_type: row.get("resource_type"),
            resource_id: row.get("resource_id"),
            details: serde_json::from_str(&row.get::<String, _>("details")).map_err(AuditError::from)?,
            severity,
            client_origin: row.get("client_origin"),
            client_agent: row.get("client_agent"),
            timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| AuditError::Store(e.to_string()))?
                .with_timezone(&chrono::Utc),
            previous_hash: row.get("previous_hash"),
            hash: row.get("hash"),
        })
    }
}

#[async_trait]
impl AuditChain for SqliteAuditChain {
    async fn append(&self, new_entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        let mut tx = self.pool.begin().await.map_err(|e| AuditError::Store(e.to_string()))?;

        let previous_hash: Option<String> =
            sqlx::query("select hash from audit_logs order by id desc limit 1")
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AuditError::Store(e.to_string()))?
                .map(|row| row.get("hash"));

        let next_id: i64 = sqlx::query("select coalesce(max(id), 0) + 1 as next_id from audit_logs")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AuditError::Store(e.to_string()))?
            .get("next_id");

        let timestamp = chrono::Utc::now();
        let canonical = canonical_json(
            next_id as u64,
            &new_entry.action,
            &new_entry.user_id,
            &new_entry.resource_type,
            &new_entry.resource_id,
            &new_entry.details,
            new_entry.severity,
            &new_entry.client_origin,
            &new_entry.client_agent,
            &timestamp,
            &previous_hash,
        )?;
        let hash = compute_hash(&canonical);
        let severity_str = match new_entry.severity {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        let details_str = serde_json::to_string(&new_entry.details).map_err(AuditError::from)?;

        sqlx::query(
            "insert into audit_logs
                (id, action, user_id, resource_type, resource_id, details, severity,
                 client_origin, client_agent, timestamp, previous_hash, hash)
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(next_id)
        .bind(&new_entry.action)
        .bind(&new_entry.user_id)
        .bind(&new_entry.resource_type)
        .bind(&new_entry.resource_id)
        .bind(&details_str)
        .bind(severity_str)
        .bind(&new_entry.client_origin)
        .bind(&new_entry.client_agent)
        .bind(timestamp.to_rfc3339())
        .bind(&previous_hash)
        .bind(&hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| AuditError::Store(e.to_string()))?;

        tx.commit().await.map_err(|e| AuditError::Store(e.to_string()))?;
        metrics::counter!("acp_audit_entries_total").increment(1);

        Ok(AuditLogEntry {
            id: next_id as u64,
            action: new_entry.action,
            user_id: new_entry.user_id,
            resource_type: new_entry.resource_type,
            resource_id: new_entry.resource_id,
            details: new_entry.details,
            severity: new_entry.severity,
            client_origin: new_entry.client_origin,
            client_agent: new_entry.client_agent,
            timestamp,
            previous_hash,
            hash,
        })
    }

    async fn entries(&self, limit: Option<usize>) -> Result<Vec<AuditLogEntry>, AuditError> {
        let rows = match limit {
            Some(n) => {
                sqlx::query("select * from audit_logs order by id asc limit ?1")
                    .bind(n as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query("select * from audit_logs order by id asc").fetch_all(&self.pool).await,
        }
        .map_err(|e| AuditError::Store(e.to_string()))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn latest_hash(&self) -> Result<Option<String>, AuditError> {
        let row = sqlx::query("select hash from audit_logs order by id desc limit 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuditError::Store(e.to_string()))?;
        Ok(row.map(|r| r.get("hash")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::verify_chain;
    use serde_json::json;

    async fn chain() -> SqliteAuditChain {
        SqliteAuditChain::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn genesis_entry_has_no_previous_hash() {
        let chain = chain().await;
        let entry = chain.append(NewAuditEntry::new("ingest.complete", Severity::Low)).await.unwrap();
        assert!(entry.previous_hash.is_none());
    }

    #[tokio::test]
    async fn chain_links_persist_across_appends() {
        let chain = chain().await;
        let first = chain.append(NewAuditEntry::new("ingest.complete", Severity::Low)).await.unwrap();
        let second = chain.append(NewAuditEntry::new("search.query", Severity::Low)).await.unwrap();
        assert_eq!(second.previous_hash, Some(first.hash));
    }

    #[tokio::test]
    async fn verify_chain_passes_on_untampered_sqlite_log() {
        let chain = chain().await;
        for i in 0..4 {
            chain
                .append(NewAuditEntry::new(format!("action.{i}"), Severity::Low).with_details(json!({"i": i})))
                .await
                .unwrap();
        }
        let report = verify_chain(&chain, None).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.total, 4);
    }

    #[tokio::test]
    async fn tampering_a_row_directly_is_detected() {
        let chain = chain().await;
        chain.append(NewAuditEntry::new("a", Severity::Low).with_details(json!({"i": 1}))).await.unwrap();
        chain.append(NewAuditEntry::new("b", Severity::Low).with_details(json!({"i": 2}))).await.unwrap();

        sqlx::query("update audit_logs set details = ?1 where id = 1")
            .bind(json!({"i": 999}).to_string())
            .execute(&chain.pool)
            .await
            .unwrap();

        let report = verify_chain(&chain, None).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors[0].entry_id, 1);
    }
}
