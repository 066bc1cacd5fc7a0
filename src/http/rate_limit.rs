//! Per-client fixed-window rate limiting (§6 `RATE_LIMIT_REQUESTS` /
//! `RATE_LIMIT_WINDOW`), applied ahead of authentication so unauthenticated
//! requests (e.g. `/auth/login`) are still bounded.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::cache::RateLimiter;
use crate::http::error::ApiError;

pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if limiter.allow(&addr.ip().to_string()).await {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::rate_limited("rate limit exceeded"))
    }
}
