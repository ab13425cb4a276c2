//! Rate limiting port for webhook admission.
//!
//! Implementations count requests per key in fixed windows. The in-memory
//! adapter serves single-process deployments and tests; the Redis adapter
//! shares counters across processes via INCR + EXPIRE.

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

use crate::domain::foundation::Timestamp;

/// Port for rate limiting operations.
///
/// Implementations must be safe under concurrent `check` calls for the
/// same key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key` and reports whether it fits the policy.
    async fn check(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Current status without counting a request.
    async fn status(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, RateLimitError>;

    /// Clears the current window for `key`.
    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError>;
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    /// Groups keys by purpose (e.g. `flutterwave-webhook`).
    pub namespace: String,
    /// Identifier within the namespace, such as a source IP.
    pub identifier: String,
}

impl RateLimitKey {
    pub fn new(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
        }
    }

    /// Per-source-IP key for inbound webhooks.
    pub fn webhook_ip(ip: IpAddr) -> Self {
        Self::new("flutterwave-webhook", ip.to_string())
    }

    /// Returns the Redis key string for this rate limit key.
    pub fn to_redis_key(&self) -> String {
        format!("ratelimit:{}:{}", self.namespace, self.identifier)
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.identifier)
    }
}

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_secs: u32,
}

impl RateLimitPolicy {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window_secs: 60,
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    /// Seconds until the client should retry (at least 1).
    pub retry_after_secs: u32,
    pub message: String,
}

impl RateLimitDenied {
    pub fn new(key: &RateLimitKey, limit: u32, retry_after_secs: u32) -> Self {
        let retry_after_secs = retry_after_secs.max(1);
        Self {
            limit,
            retry_after_secs,
            message: format!(
                "Rate limit exceeded for {}. Retry after {} seconds.",
                key.namespace, retry_after_secs
            ),
        }
    }
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
