//! Shared application state for both services' routers.

use std::sync::Arc;

use axum::extract::FromRef;
use ingestion::{IngestionCoordinator, SearchService};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::TokenService;
use crate::cache::{ObjectCache, RateLimiter};
use crate::config::AppConfig;
use crate::http::auth_mw::AuthContext;
use crate::users::{ApiKeyStore, UserStore};
use crate::workflow::WorkflowEngine;

#[derive(Clone)]
pub struct IngestState {
    pub coordinator: Arc<IngestionCoordinator>,
    pub search: Arc<SearchService>,
    pub jobs: Arc<dyn ingestion::JobStore>,
    pub audit: Arc<dyn audit_chain::chain::AuditChain>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cache: Arc<dyn ObjectCache>,
    pub config: Arc<AppConfig>,
    pub metrics: PrometheusHandle,
}

impl FromRef<IngestState> for AuthContext {
    fn from_ref(state: &IngestState) -> Self {
        AuthContext { tokens: state.tokens.clone(), users: state.users.clone(), api_keys: state.api_keys.clone() }
    }
}

#[derive(Clone)]
pub struct AgentsState {
    pub engine: Arc<WorkflowEngine>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<AppConfig>,
    pub metrics: PrometheusHandle,
}

impl FromRef<AgentsState> for AuthContext {
    fn from_ref(state: &AgentsState) -> Self {
        AuthContext { tokens: state.tokens.clone(), users: state.users.clone(), api_keys: state.api_keys.clone() }
    }
}
