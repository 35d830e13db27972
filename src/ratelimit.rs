use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug)]
struct Counter {
    count: u64,
    expires_at: OffsetDateTime,
}

/// Fixed-window request counters with TTL semantics, keyed per client.
/// Same shape as the captcha store: an in-process map for a single
/// instance, swappable for an external cache behind the trait.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Bumps the counter for `key`, starting a fresh window when the
    /// previous one has lapsed, and returns the count within the current
    /// window.
    async fn incr(&self, key: &str, window: Duration) -> u64;

    /// Drops counters whose window has lapsed, returning how many were
    /// removed. Memory bound only; `incr` resets lapsed windows itself.
    async fn sweep(&self) -> usize;
}

pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Counter>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str, window: Duration) -> u64 {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().expect("counter store poisoned");
        let counter = entries.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + window,
        });
        if counter.expires_at <= now {
            counter.count = 0;
            counter.expires_at = now + window;
        }
        counter.count += 1;
        counter.count
    }

    async fn sweep(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().expect("counter store poisoned");
        let before = entries.len();
        entries.retain(|_, c| c.expires_at > now);
        before - entries.len()
    }
}

/// Per-client request throttle applied as axum middleware. Each scope
/// ("general", "auth") keeps its own keyspace in the shared store so the
/// auth endpoints can carry a tighter bound than the rest of the API.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    scope: &'static str,
    max: u64,
    window: Duration,
    message: &'static str,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        scope: &'static str,
        max: u64,
        window: Duration,
        message: &'static str,
    ) -> Self {
        Self {
            store,
            scope,
            max,
            window,
            message,
        }
    }

    pub async fn handle(self, req: Request, next: Next) -> Response {
        let key = format!("{}:{}", self.scope, client_ip(&req));
        let count = self.store.incr(&key, self.window).await;
        if count > self.max {
            warn!(%key, count, limit = self.max, "rate limit exceeded");
            return ApiError::TooManyRequests(self.message.to_string()).into_response();
        }
        next.run(req).await
    }
}

/// First hop of X-Forwarded-For when present, else the peer address.
fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn counter_increments_within_window() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(60);
        assert_eq!(store.incr("a", window).await, 1);
        assert_eq!(store.incr("a", window).await, 2);
        assert_eq!(store.incr("b", window).await, 1);
    }

    #[tokio::test]
    async fn counter_resets_after_window_lapses() {
        let store = MemoryCounterStore::new();
        // Zero-length window: lapsed by the time of the next call.
        assert_eq!(store.incr("a", Duration::ZERO).await, 1);
        assert_eq!(store.incr("a", Duration::ZERO).await, 1);
    }

    #[tokio::test]
    async fn sweep_removes_lapsed_counters() {
        let store = MemoryCounterStore::new();
        store.incr("lapsed", Duration::ZERO).await;
        store.incr("live", Duration::from_secs(60)).await;
        assert_eq!(store.sweep().await, 1);
        // The surviving counter keeps its window.
        assert_eq!(store.incr("live", Duration::from_secs(60)).await, 2);
    }

    fn throttled_app(max: u64) -> Router {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());
        let limiter = RateLimiter::new(
            store,
            "test",
            max,
            Duration::from_secs(60),
            "Too many requests, please try again later",
        );
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
                limiter.clone().handle(req, next)
            }))
    }

    fn request(ip: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(ip) = ip {
            builder = builder.header("x-forwarded-for", ip);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn requests_over_the_limit_get_429() {
        let app = throttled_app(2);
        for _ in 0..2 {
            let res = app.clone().oneshot(request(None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
        let res = app.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn limits_are_tracked_per_client() {
        let app = throttled_app(1);
        assert_eq!(
            app.clone().oneshot(request(Some("10.0.0.1"))).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            app.clone().oneshot(request(Some("10.0.0.1"))).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        // A different client still has its full budget.
        assert_eq!(
            app.clone().oneshot(request(Some("10.0.0.2"))).await.unwrap().status(),
            StatusCode::OK
        );
    }

    #[test]
    fn forwarded_header_wins_over_peer_address() {
        let req = HttpRequest::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "203.0.113.9");
    }
}
