//! Redis-backed rate limiter for multi-process deployments.
//!
//! Uses a fixed-window counter with Redis INCR + EXPIRE, so every gateway
//! instance sharing the Redis server sees the same per-IP counts.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter,
};

/// Redis fixed-window rate limiter.
///
/// 1. INCR the key
/// 2. If the count is 1, EXPIRE it after the window
/// 3. Deny when the count exceeds the limit
///
/// Requests can briefly exceed the limit across a window boundary.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn))
    }

    async fn seconds_until_reset(
        conn: &mut MultiplexedConnection,
        redis_key: &str,
        window_secs: u32,
    ) -> Result<i64, RateLimitError> {
        let ttl: i64 = conn.ttl(redis_key).await.map_err(unavailable)?;
        Ok(if ttl > 0 { ttl } else { i64::from(window_secs) })
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = key.to_redis_key();
        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&redis_key, 1_i64).await.map_err(unavailable)?;

        if count == 1 {
            conn.expire::<_, ()>(&redis_key, i64::from(policy.window_secs))
                .await
                .map_err(unavailable)?;
        }

        let reset_secs = Self::seconds_until_reset(&mut conn, &redis_key, policy.window_secs).await?;
        let reset_at = Timestamp::now().plus_secs(reset_secs);

        if count > i64::from(policy.limit) {
            return Ok(RateLimitResult::Denied(RateLimitDenied::new(
                key,
                policy.limit,
                reset_secs as u32,
            )));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count as u32),
            reset_at,
            window_secs: policy.window_secs,
        }))
    }

    async fn status(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, RateLimitError> {
        let redis_key = key.to_redis_key();
        let mut conn = self.conn.clone();

        let count: Option<i64> = conn.get(&redis_key).await.map_err(unavailable)?;
        let count = count.unwrap_or(0).max(0) as u32;

        let reset_secs = Self::seconds_until_reset(&mut conn, &redis_key, policy.window_secs).await?;

        Ok(RateLimitStatus {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count),
            reset_at: Timestamp::now().plus_secs(reset_secs),
            window_secs: policy.window_secs,
        })
    }

    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.to_redis_key())
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Redis integration tests need a running server:
    //   REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored

    #[tokio::test]
    #[ignore]
    async fn counts_and_denies_against_live_redis() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
        let limiter = RedisRateLimiter::connect(&url).await.unwrap();
        let key = RateLimitKey::new("flutterwave-webhook-test", "10.0.0.1");
        let policy = RateLimitPolicy::per_minute(2);
        limiter.reset(&key).await.unwrap();

        assert!(limiter.check(&key, policy).await.unwrap().is_allowed());
        assert!(limiter.check(&key, policy).await.unwrap().is_allowed());
        assert!(limiter.check(&key, policy).await.unwrap().is_denied());

        let status = limiter.status(&key, policy).await.unwrap();
        assert_eq!(status.remaining, 0);

        limiter.reset(&key).await.unwrap();
    }

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let result = RedisRateLimiter::connect("not a redis url").await;
        assert!(matches!(result, Err(RateLimitError::Unavailable(_))));
    }
}
