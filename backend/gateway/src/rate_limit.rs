//! Gateway Rate Limiting Module
//!
//! Fixed-window request counting per client IP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ocr_api::IntakeResponse;

/// Above this many tracked clients, expired windows are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Clone)]
pub struct RateLimiter {
    // client -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, 60)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count a request from `client`; `false` once the window is used up.
    pub async fn check_limit(&self, client: &str) -> bool {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        if limits.len() > PRUNE_THRESHOLD {
            let window = self.window;
            limits.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let state = limits.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) > self.window {
            state.0 = 1;
            state.1 = now;
            debug!(client, "Rate limit window reset");
            true
        } else {
            state.0 += 1;
            if state.0 > self.max_requests {
                warn!(client, "Rate limit exceeded");
                false
            } else {
                debug!(client, count = state.0, max = self.max_requests, "Rate limit OK");
                true
            }
        }
    }
}

/// Middleware answering 429 once a client exhausts its window.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check_limit(&client).await {
        return next.run(request).await;
    }

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(IntakeResponse::failure(
            "Too many requests. Please wait a moment and try again.",
        )),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&limiter.window.as_secs().to_string()) {
        response.headers_mut().insert(RETRY_AFTER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check_limit("10.0.0.1").await);
        assert!(limiter.check_limit("10.0.0.1").await);
        assert!(!limiter.check_limit("10.0.0.1").await);
        // Other clients are counted separately.
        assert!(limiter.check_limit("10.0.0.2").await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check_limit("10.0.0.1").await);
    }
}
