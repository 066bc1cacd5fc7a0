//! The append-only entry type and its canonicalization/hashing rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::AuditError;

/// Severity assigned to an audited action, independent of its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One immutable, hash-linked node in the audit chain (§3 `AuditLogEntry`).
///
/// `id` is assigned by the store at append time (monotonic, insertion
/// order); `hash` and `previous_hash` are filled in by
/// [`crate::chain::AuditChain::append`] and must never be set by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub action: String,
    pub user_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub details: Value,
    pub severity: Severity,
    pub client_origin: Option<String>,
    pub client_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub hash: String,
}

/// Fields supplied by the caller; the store fills in `id`, `timestamp`,
/// `previous_hash` and `hash`.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: String,
    pub user_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub details: Value,
    pub severity: Severity,
    pub client_origin: Option<String>,
    pub client_agent: Option<String>,
}

impl NewAuditEntry {
    #[must_use]
    pub fn new(action: impl Into<String>, severity: Severity) -> Self {
        Self {
            action: action.into(),
            user_id: None,
            resource_type: None,
            resource_id: None,
            details: Value::Object(Map::new()),
            severity,
            client_origin: None,
            client_agent: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    #[must_use]
    pub fn with_client(mut self, origin: impl Into<String>, agent: impl Into<String>) -> Self {
        self.client_origin = Some(origin.into());
        self.client_agent = Some(agent.into());
        self
    }
}

/// Builds the canonical JSON representation hashed for an entry: every
/// field except `hash` itself, in a stable (alphabetical, via
/// `serde_json`'s default `BTreeMap`-backed object) key order, with no
/// insignificant whitespace.
pub(crate) fn canonical_json(
    id: u64,
    action: &str,
    user_id: &Option<String>,
    resource_type: &Option<String>,
    resource_id: &Option<String>,
    details: &Value,
    severity: Severity,
    client_origin: &Option<String>,
    client_agent: &Option<String>,
    timestamp: &DateTime<Utc>,
    previous_hash: &Option<String>,
) -> Result<String, AuditError> {
    let mut map = Map::new();
    map.insert("action".into(), Value::String(action.to_string()));
    map.insert(
        "client_agent".into(),
        client_agent.clone().map_or(Value::Null, Value::String),
    );
    map.insert(
        "client_origin".into(),
        client_origin.clone().map_or(Value::Null, Value::String),
    );
    map.insert("details".into(), details.clone());
    map.insert("id".into(), Value::from(id));
    map.insert(
        "previous_hash".into(),
        previous_hash.clone().map_or(Value::Null, Value::String),
    );
    map.insert(
        "resource_id".into(),
        resource_id.clone().map_or(Value::Null, Value::String),
    );
    map.insert(
        "resource_type".into(),
        resource_type.clone().map_or(Value::Null, Value::String),
    );
    map.insert("severity".into(), serde_json::to_value(severity)?);
    map.insert("timestamp".into(), Value::String(timestamp.to_rfc3339()));
    map.insert(
        "user_id".into(),
        user_id.clone().map_or(Value::Null, Value::String),
    );

    serde_json::to_string(&Value::Object(map)).map_err(AuditError::from)
}

/// Computes `hash = SHA256(canonical_json(entry))`, hex-encoded.
pub(crate) fn compute_hash(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

impl AuditLogEntry {
    /// Recomputes this entry's hash from its stored fields and compares it
    /// to the stored `hash` (§4.9 Verification, §8 invariant 4).
    pub(crate) fn recompute_hash(&self) -> Result<String, AuditError> {
        let canonical = canonical_json(
            self.id,
            &self.action,
            &self.user_id,
            &self.resource_type,
            &self.resource_id,
            &self.details,
            self.severity,
            &self.client_origin,
            &self.client_agent,
            &self.timestamp,
            &self.previous_hash,
        )?;
        Ok(compute_hash(&canonical))
    }
}
