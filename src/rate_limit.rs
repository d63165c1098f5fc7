use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, Result};
use crate::identity::bearer_token;
use crate::security;
use crate::AppState;

/// Fixed-window request limiter keyed by caller identity
pub struct RateLimiter {
    requests_per_minute: u64,
    buckets: Mutex<Buckets>,
}

/// Counters for the current one-minute window. The window is global, so
/// rolling into a new one drops every stale bucket at once.
struct Buckets {
    window: i64,
    counts: HashMap<String, u64>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u64) -> Self {
        Self {
            requests_per_minute,
            buckets: Mutex::new(Buckets {
                window: 0,
                counts: HashMap::new(),
            }),
        }
    }

    /// Record one request for `key`; rejects once the per-minute budget
    /// for the current window is spent.
    pub fn check(&self, key: &str, now: i64) -> Result<()> {
        let window = now / 60;
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.window != window {
            buckets.window = window;
            buckets.counts.clear();
        }

        let count = buckets.counts.entry(key.to_string()).or_insert(0);
        if *count >= self.requests_per_minute {
            tracing::warn!("Rate limit exceeded for {}", key);
            return Err(AppError::RateLimited);
        }

        *count += 1;
        Ok(())
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .counts
            .len()
    }
}

/// Per-caller rate limiting middleware, applied in front of every route.
///
/// The bucket key combines the token subject (signature-checked, expiry
/// ignored so expired tokens still attribute to their owner) with the
/// client address.
pub async fn enforce(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let subject = bearer_token(req.headers())
        .and_then(|t| security::decode_signed_claims(t, &state.config.jwt_secret))
        .map(|c| c.sub)
        .unwrap_or_else(|| "anon".to_string());

    let key = format!("{}:{}", subject, client_ip(&req));

    if let Err(e) = state
        .rate_limiter
        .check(&key, chrono::Utc::now().timestamp())
    {
        return e.into_response();
    }

    next.run(req).await
}

fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            return first.trim().to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
