//! In-memory rate limiter for tests and single-process deployments.
//!
//! Uses a fixed-window counter per key. Counters live in this process
//! only, so several gateway instances behind a load balancer each apply
//! the limit independently.
//!
//! Expired windows are dropped by `check` at most once per
//! [`EXPIRED_SWEEP_INTERVAL_SECS`], so the map only holds keys seen within
//! roughly the last two windows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    Clock, RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter, SystemClock,
};

/// Minimum spacing between sweeps of expired windows.
pub const EXPIRED_SWEEP_INTERVAL_SECS: i64 = 60;

/// Fixed-window rate limiter backed by a `HashMap`.
pub struct InMemoryRateLimiter {
    windows: Arc<RwLock<Windows>>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct Windows {
    entries: HashMap<String, WindowState>,
    last_sweep: i64,
}

impl Windows {
    fn sweep(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, state| now < state.window_end());
        self.last_sweep = now;
        before - self.entries.len()
    }
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: i64,
    window_secs: u32,
}

impl WindowState {
    fn window_end(&self) -> i64 {
        self.window_start + i64::from(self.window_secs)
    }
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let windows = Windows {
            entries: HashMap::new(),
            last_sweep: clock.now().as_unix_secs(),
        };
        Self {
            windows: Arc::new(RwLock::new(windows)),
            clock,
        }
    }

    /// Drops every expired window, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now().as_unix_secs();
        self.windows.write().await.sweep(now)
    }

    /// Number of tracked keys, expired or not.
    pub async fn len(&self) -> usize {
        self.windows.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRateLimiter").finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = self.clock.now().as_unix_secs();
        let mut windows = self.windows.write().await;

        if now - windows.last_sweep >= EXPIRED_SWEEP_INTERVAL_SECS {
            let removed = windows.sweep(now);
            if removed > 0 {
                tracing::debug!(removed, "Dropped expired rate limit windows");
            }
        }

        let state = windows
            .entries
            .entry(key.to_redis_key())
            .or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
                window_secs: policy.window_secs,
            });

        if now >= state.window_end() {
            state.count = 0;
            state.window_start = now;
            state.window_secs = policy.window_secs;
        }

        if state.count >= policy.limit {
            let retry_after = state.window_end().saturating_sub(now) as u32;
            return Ok(RateLimitResult::Denied(RateLimitDenied::new(
                key,
                policy.limit,
                retry_after,
            )));
        }

        state.count += 1;

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(state.count),
            reset_at: Timestamp::from_unix_secs(state.window_end()),
            window_secs: policy.window_secs,
        }))
    }

    async fn status(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, RateLimitError> {
        let now = self.clock.now().as_unix_secs();
        let windows = self.windows.read().await;

        let (count, window_end) = windows
            .entries
            .get(&key.to_redis_key())
            .filter(|state| now < state.window_end())
            .map(|state| (state.count, state.window_end()))
            .unwrap_or((0, now + i64::from(policy.window_secs)));

        Ok(RateLimitStatus {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count),
            reset_at: Timestamp::from_unix_secs(window_end),
            window_secs: policy.window_secs,
        })
    }

    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError> {
        self.windows.write().await.entries.remove(&key.to_redis_key());
        Ok(())
    }
}
