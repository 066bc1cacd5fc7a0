//! The external cache/queue collaborator (§1, §5): token revocation sets
//! and rate-limit counters both sit behind the same small key/value
//! abstraction a Redis-backed deployment would implement.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration);
    async fn get(&self, key: &str) -> Option<String>;
    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
    async fn delete(&self, key: &str);
    /// Atomically increments `key` and returns the post-increment count,
    /// creating it with `ttl` if absent — the primitive the rate limiter
    /// builds on.
    async fn incr(&self, key: &str, ttl: Duration) -> u64;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Reference implementation backing local development and tests; a
/// production deployment swaps in a Redis-backed [`ObjectCache`] without
/// touching callers.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectCache for InMemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at: Instant::now() + ttl });
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn incr(&self, key: &str, ttl: Duration) -> u64 {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let count = match entries.get(key) {
            Some(entry) if entry.expires_at > now => entry.value.parse::<u64>().unwrap_or(0) + 1,
            _ => 1,
        };
        entries.insert(key.to_string(), Entry { value: count.to_string(), expires_at: now + ttl });
        count
    }
}

/// Fixed-window rate limiter built on [`ObjectCache::incr`] (§6
/// `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_WINDOW`).
pub struct RateLimiter {
    cache: Arc<dyn ObjectCache>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(cache: Arc<dyn ObjectCache>, limit: u64, window: Duration) -> Self {
        Self { cache, limit, window }
    }

    /// Returns `true` if `identity` (user id or IP) is still within its
    /// window quota, incrementing the counter as a side effect.
    pub async fn allow(&self, identity: &str) -> bool {
        let key = format!("ratelimit:{identity}");
        let count = self.cache.incr(&key, self.window).await;
        count <= self.limit
    }
}
