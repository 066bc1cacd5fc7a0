//! The append-only store trait, its in-memory reference implementation,
//! and chain verification (§4.9).

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::entry::{canonical_json, compute_hash, AuditLogEntry, NewAuditEntry};
use crate::error::AuditError;

/// Storage abstraction for the hash-linked log. The relational store is
/// the source of truth (§5); implementors are expected to insert the
/// audited operation and its audit row in the same transaction where
/// possible (§4.9 Append, step 4).
#[async_trait]
pub trait AuditChain: Send + Sync {
    /// Append `entry`, computing `previous_hash` from the most recently
    /// inserted row and `hash` from the canonical JSON of all fields.
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError>;

    /// Returns entries in insertion order, optionally capped at `limit`.
    async fn entries(&self, limit: Option<usize>) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Returns the hash of the most recently appended entry, or `None` for
    /// an empty (genesis-pending) chain.
    async fn latest_hash(&self) -> Result<Option<String>, AuditError>;
}

/// Result of [`verify_chain`] (§4.9 `verify_chain`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationReport {
    pub valid: bool,
    pub total: usize,
    pub verified: usize,
    pub errors: Vec<VerificationError>,
}

/// One detected inconsistency, anchored to the entry id where it was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationError {
    pub entry_id: u64,
    pub kind: VerificationErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationErrorKind {
    /// Recomputing the entry's hash did not match the stored value.
    HashMismatch,
    /// This entry's `previous_hash` does not equal the prior entry's hash.
    ChainBroken,
}

/// Recomputes every entry's hash and checks chain linkage in insertion
/// order (§4.9 Verification, §8 invariant 4).
pub async fn verify_chain(
    chain: &dyn AuditChain,
    limit: Option<usize>,
) -> Result<VerificationReport, AuditError> {
    let entries = chain.entries(limit).await?;
    let total = entries.len();
    let mut verified = 0usize;
    let mut errors = Vec::new();
    let mut prior_hash: Option<String> = None;

    for entry in &entries {
        let mut entry_ok = true;

        match entry.recompute_hash() {
            Ok(recomputed) if recomputed == entry.hash => {}
            Ok(recomputed) => {
                entry_ok = false;
                errors.push(VerificationError {
                    entry_id: entry.id,
                    kind: VerificationErrorKind::HashMismatch,
                    detail: format!("stored={} recomputed={}", entry.hash, recomputed),
                });
            }
            Err(err) => {
                entry_ok = false;
                errors.push(VerificationError {
                    entry_id: entry.id,
                    kind: VerificationErrorKind::HashMismatch,
                    detail: err.to_string(),
                });
            }
        }

        if entry.previous_hash != prior_hash {
            entry_ok = false;
            errors.push(VerificationError {
                entry_id: entry.id,
                kind: VerificationErrorKind::ChainBroken,
                detail: format!(
                    "expected previous_hash={:?} found={:?}",
                    prior_hash, entry.previous_hash
                ),
            });
        }

        if entry_ok {
            verified += 1;
        }
        prior_hash = Some(entry.hash.clone());
    }

    Ok(VerificationReport {
        valid: errors.is_empty(),
        total,
        verified,
        errors,
    })
}

/// Reference in-memory [`AuditChain`]. Production deployments back this
/// trait with the `audit_logs` relational table instead; the append
/// algorithm (load latest hash, build entry, hash, insert) is identical.
#[derive(Default)]
pub struct InMemoryAuditChain {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryAuditChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditChain for InMemoryAuditChain {
    async fn append(&self, new_entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        let mut guard = self.entries.lock().await;
        let previous_hash = guard.last().map(|e| e.hash.clone());
        let id = guard.len() as u64 + 1;
        let timestamp = Utc::now();

        let canonical = canonical_json(
            id,
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

        let entry = AuditLogEntry {
            id,
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
        };
        guard.push(entry.clone());
        metrics::counter!("acp_audit_entries_total").increment(1);
        Ok(entry)
    }

    async fn entries(&self, limit: Option<usize>) -> Result<Vec<AuditLogEntry>, AuditError> {
        let guard = self.entries.lock().await;
        match limit {
            Some(n) => Ok(guard.iter().take(n).cloned().collect()),
            None => Ok(guard.clone()),
        }
    }

    async fn latest_hash(&self) -> Result<Option<String>, AuditError> {
        let guard = self.entries.lock().await;
        Ok(guard.last().map(|e| e.hash.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Severity;
    use serde_json::json;

    #[tokio::test]
    async fn genesis_entry_has_no_previous_hash() {
        let chain = InMemoryAuditChain::new();
        let entry = chain
            .append(NewAuditEntry::new("ingest.complete", Severity::Low))
            .await
            .unwrap();
        assert!(entry.previous_hash.is_none());
        assert!(!entry.hash.is_empty());
    }

    #[tokio::test]
    async fn chain_links_successive_entries() {
        let chain = InMemoryAuditChain::new();
        let first = chain
            .append(NewAuditEntry::new("ingest.complete", Severity::Low))
            .await
            .unwrap();
        let second = chain
            .append(NewAuditEntry::new("search.query", Severity::Low))
            .await
            .unwrap();
        assert_eq!(second.previous_hash, Some(first.hash));
    }

    #[tokio::test]
    async fn untampered_chain_verifies() {
        let chain = InMemoryAuditChain::new();
        for i in 0..5 {
            chain
                .append(
                    NewAuditEntry::new(format!("action.{i}"), Severity::Low)
                        .with_details(json!({"i": i})),
                )
                .await
                .unwrap();
        }
        let report = verify_chain(&chain, None).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.verified, 5);
        assert_eq!(report.total, 5);
    }

    #[tokio::test]
    async fn tampering_with_details_is_detected_at_that_entry() {
        let chain = InMemoryAuditChain::new();
        for i in 0..3 {
            chain
                .append(
                    NewAuditEntry::new(format!("action.{i}"), Severity::Low)
                        .with_details(json!({"i": i})),
                )
                .await
                .unwrap();
        }

        {
            let mut guard = chain.entries.lock().await;
            guard[1].details = json!({"i": 999});
        }

        let report = verify_chain(&chain, None).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].entry_id, 2);
        assert_eq!(
            report.errors[0].kind,
            VerificationErrorKind::HashMismatch
        );
    }

    #[tokio::test]
    async fn broken_link_is_detected() {
        let chain = InMemoryAuditChain::new();
        for i in 0..3 {
            chain
                .append(NewAuditEntry::new(format!("action.{i}"), Severity::Low))
                .await
                .unwrap();
        }
        {
            let mut guard = chain.entries.lock().await;
            guard[2].previous_hash = Some("deadbeef".to_string());
        }
        let report = verify_chain(&chain, None).await.unwrap();
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.kind == VerificationErrorKind::ChainBroken));
    }
}
