//! Axum routers for the Ingest Service and Agents Service (§6).

pub mod agents_routes;
pub mod auth_mw;
pub mod error;
pub mod health;
pub mod ingest_routes;
pub mod rate_limit;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::{AgentsState, IngestState};

/// Builds the Ingest Service router (§6 Ingest Service table).
pub fn ingest_router(state: IngestState) -> Router {
    let rate_limiter = state.rate_limiter.clone();
    Router::new()
        .route("/ingest/upload", post(ingest_routes::upload))
        .route("/ingest/paste", post(ingest_routes::paste))
        .route("/ingest/status/{job_id}", get(ingest_routes::job_status))
        .route("/ingest/jobs", get(ingest_routes::list_jobs))
        .route("/ingest/jobs/{job_id}", delete(ingest_routes::delete_job))
        .route("/ingest/jobs/{job_id}/retry", post(ingest_routes::retry_job))
        .route("/search", post(ingest_routes::search))
        .route("/search/similar/{chunk_id}", get(ingest_routes::search_similar))
        .route("/search/export", post(ingest_routes::search_export))
        .route("/auth/login", post(ingest_routes::login))
        .route("/auth/logout", post(ingest_routes::logout))
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/health/startup", get(health::startup))
        .route("/metrics", get(health::metrics))
        .layer(from_fn_with_state(rate_limiter, rate_limit::enforce))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn agents_live() -> &'static str {
    "ok"
}

async fn agents_metrics(axum::extract::State(state): axum::extract::State<AgentsState>) -> String {
    state.metrics.render()
}

/// Builds the Agents Service router (§6 Agents Service table).
pub fn agents_router(state: AgentsState) -> Router {
    let rate_limiter = state.rate_limiter.clone();
    Router::new()
        .route("/api/v1/jobs", post(agents_routes::submit).get(agents_routes::list))
        .route("/api/v1/jobs/{job_id}", get(agents_routes::status))
        .route("/api/v1/jobs/{job_id}/answers", post(agents_routes::submit_answers))
        .route("/api/v1/jobs/{job_id}/results", get(agents_routes::results))
        .route("/health/live", get(agents_live))
        .route("/metrics", get(agents_metrics))
        .layer(from_fn_with_state(rate_limiter, rate_limit::enforce))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
