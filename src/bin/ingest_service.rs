//! Ingest Service entry point (§6): wires the relational store, vector
//! index, embedding provider, and audit chain into a running HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use acp_core::auth::TokenService;
use acp_core::cache::{InMemoryCache, ObjectCache, RateLimiter};
use acp_core::config::AppConfig;
use acp_core::http::{ingest_router, IngestState};
use acp_core::llm_client::HttpEmbeddingClient;
use acp_core::users::{SqliteApiKeyStore, SqliteUserStore};
use audit_chain::prelude::AuditChain;
use audit_chain::sqlite::SqliteAuditChain;
use chunker::prelude::ChunkerConfig;
use ingestion::{IngestionCoordinator, SearchService, SqliteChunkStore, SqliteJobStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use pii_guard::config::{PiiPolicy, RedactionMode};
use pii_guard::detector::PiiDetector;
use tokio::net::TcpListener;
use vector_index::sqlite::SqliteVectorIndex;
use vector_index::VectorIndex;

/// Exit code for a configuration validation failure (§6 Exit codes).
const EXIT_CONFIG_ERROR: i32 = 1;
/// Exit code for a dependency the service couldn't reach at startup.
const EXIT_DEPENDENCY_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env(false) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    acp_core::telemetry::init(config.debug);

    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(err) => acp_core::telemetry::fatal("failed to install metrics recorder", &err, EXIT_DEPENDENCY_ERROR),
    };

    let database_url = config.database_url.clone().unwrap_or_else(|| {
        acp_core::telemetry::fatal("DATABASE_URL is required outside test mode", &"missing", EXIT_CONFIG_ERROR)
    });
    let vector_db_url = config.vector_db_url.clone().unwrap_or_else(|| {
        acp_core::telemetry::fatal("VECTOR_DB_URL is required outside test mode", &"missing", EXIT_CONFIG_ERROR)
    });

    let jobs = match SqliteJobStore::open(&database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn ingestion::JobStore>,
        Err(err) => acp_core::telemetry::fatal("failed to open job store", &err, EXIT_DEPENDENCY_ERROR),
    };
    let chunks = match SqliteChunkStore::open(&database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn ingestion::ChunkStore>,
        Err(err) => acp_core::telemetry::fatal("failed to open chunk store", &err, EXIT_DEPENDENCY_ERROR),
    };
    let vectors = match SqliteVectorIndex::open(&vector_db_url, "knowledge_chunks").await {
        Ok(index) => Arc::new(index) as Arc<dyn VectorIndex>,
        Err(err) => acp_core::telemetry::fatal("failed to open vector index", &err, EXIT_DEPENDENCY_ERROR),
    };
    let audit = match SqliteAuditChain::open(&database_url).await {
        Ok(chain) => Arc::new(chain) as Arc<dyn AuditChain>,
        Err(err) => acp_core::telemetry::fatal("failed to open audit chain", &err, EXIT_DEPENDENCY_ERROR),
    };
    let users = match SqliteUserStore::open(&database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn acp_core::users::UserStore>,
        Err(err) => acp_core::telemetry::fatal("failed to open user store", &err, EXIT_DEPENDENCY_ERROR),
    };
    let api_keys = match SqliteApiKeyStore::open(&database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn acp_core::users::ApiKeyStore>,
        Err(err) => acp_core::telemetry::fatal("failed to open api key store", &err, EXIT_DEPENDENCY_ERROR),
    };

    let embedder = Arc::new(HttpEmbeddingClient::new(
        config.embedding_endpoint.clone(),
        config.embedding_model.clone(),
        "1",
    ));

    let pii = match PiiDetector::new(PiiPolicy::default()) {
        Ok(detector) => Arc::new(detector),
        Err(err) => acp_core::telemetry::fatal("failed to build PII detector", &err, EXIT_DEPENDENCY_ERROR),
    };

    let coordinator = Arc::new(IngestionCoordinator::new(
        jobs.clone(),
        chunks.clone(),
        embedder.clone(),
        vectors.clone(),
        pii,
        RedactionMode::default(),
        ChunkerConfig::default(),
        audit.clone(),
    ));
    let search = Arc::new(SearchService::new(vectors, chunks, embedder));

    let cache: Arc<dyn ObjectCache> = Arc::new(InMemoryCache::new());
    let rate_limiter = Arc::new(RateLimiter::new(
        cache.clone(),
        u64::from(config.rate_limit_requests),
        Duration::from_secs(u64::from(config.rate_limit_window_secs)),
    ));
    let tokens = Arc::new(TokenService::new(config.jwt_secret_key.value()));

    let state = IngestState {
        coordinator,
        search,
        jobs,
        audit,
        tokens,
        users,
        api_keys,
        rate_limiter,
        cache,
        config: Arc::new(config),
        metrics: metrics_handle,
    };

    let port: u16 = std::env::var("INGEST_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => acp_core::telemetry::fatal("failed to bind ingest service listener", &err, EXIT_DEPENDENCY_ERROR),
    };

    tracing::info!(%addr, "ingest service listening");
    let router = ingest_router(state);
    if let Err(err) = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await {
        acp_core::telemetry::fatal("ingest service stopped unexpectedly", &err, EXIT_DEPENDENCY_ERROR);
    }
}
