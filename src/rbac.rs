//! Users, roles, and the namespaced permission strings the rest of the
//! platform gates on (§3 `User / Role / Permission`).
//!
//! Permissions are plain `"namespace:action"` strings rather than a closed
//! enum — new capabilities (export, audit, agents) get their own namespace
//! without touching this module, matching how `ingestion::search` already
//! treats permissions as opaque strings to check against.

use std::collections::HashSet;

use ingestion::types::Sensitivity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Analyst,
    Reviewer,
    Viewer,
}

impl Role {
    /// The permission set a system role grants out of the box. Deployments
    /// may still attach extra permissions directly to a [`User`].
    #[must_use]
    pub fn default_permissions(self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[
                "data:view_restricted",
                "data:view_confidential",
                "data:view_sensitive",
                "ingest:submit",
                "ingest:retry",
                "ingest:delete",
                "search:read",
                "export:read",
                "agents:submit",
                "agents:answer",
                "agents:read",
                "audit:read",
                "users:manage",
            ],
            Role::Analyst => &[
                "data:view_confidential",
                "data:view_sensitive",
                "ingest:submit",
                "search:read",
                "export:read",
                "agents:submit",
                "agents:answer",
                "agents:read",
            ],
            Role::Reviewer => &[
                "data:view_sensitive",
                "search:read",
                "export:read",
                "agents:read",
                "audit:read",
            ],
            Role::Viewer => &["search:read", "agents:read"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub roles: Vec<Role>,
    /// Permissions granted directly to this user, on top of whatever its
    /// roles already carry.
    pub extra_permissions: Vec<String>,
    pub active: bool,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self { id: id.into(), username: username.into(), roles, extra_permissions: Vec::new(), active: true }
    }

    #[must_use]
    pub fn permissions(&self) -> HashSet<&str> {
        let mut set: HashSet<&str> = self.roles.iter().flat_map(|r| r.default_permissions().iter().copied()).collect();
        set.extend(self.extra_permissions.iter().map(String::as_str));
        set
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.active && self.permissions().contains(permission)
    }
}

/// Adapts [`User`] to the sensitivity gate `ingestion::search` consumes,
/// so the same access-control decision governs both raw search results and
/// everything downstream that reads a [`Sensitivity`] (export, agent
/// retrieval).
impl ingestion::search::CallerIdentity for User {
    fn has_permission(&self, permission: &str) -> bool {
        User::has_permission(self, permission)
    }
}

/// Whether `user` may read content marked at `sensitivity` (§8 invariant 6:
/// "responses never include chunks above the caller's granted
/// sensitivity level").
#[must_use]
pub fn sensitivity_allowed(user: &User, sensitivity: Sensitivity) -> bool {
    use ingestion::search::CallerIdentity;
    sensitivity <= user.max_sensitivity()
}

/// The identity the agent pipeline's internal `retrieve_context` stage
/// searches as (§4.7). One [`WorkflowEngine`](crate::workflow::WorkflowEngine)
/// instance is shared across every submitting user, so the graph can't carry
/// a per-request caller all the way into the node it builds at construction
/// time; retrieval instead runs at a fixed ceiling below `Restricted`, and
/// the submitting user's own access is enforced separately when they read
/// the workflow's results back (`agents:read` plus an ownership check).
pub struct SystemCaller;

impl ingestion::search::CallerIdentity for SystemCaller {
    fn has_permission(&self, permission: &str) -> bool {
        matches!(permission, "data:view_sensitive" | "data:view_confidential")
    }
}
