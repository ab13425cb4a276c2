//! Cached OAuth access token with bounded, cancellable refresh.
//!
//! The cache lock is held across check-and-refresh, so concurrent callers
//! that find the token expired wait for one refresh instead of each
//! hitting the identity provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::Timestamp;
use crate::domain::gateway::{AccessToken, GatewayError, TransportFailure};
use crate::ports::{Clock, SystemClock, TokenFetchError, TokenSource};

/// Retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<AccessToken>>,
    max_retries: u32,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn TokenSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            token: Mutex::new(None),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns a valid bearer token, refreshing it if needed.
    ///
    /// # Errors
    ///
    /// - `AuthFailed` when the grant is malformed, rejected, or every retry failed
    /// - `Cancelled` when `cancel` fires before a token is obtained
    pub async fn get_token(&self, cancel: &CancellationToken) -> Result<String, GatewayError> {
        let mut slot = self.token.lock().await;

        let now = self.clock.now();
        if let Some(token) = slot.as_ref().filter(|t| t.is_valid_at(&now)) {
            return Ok(token.expose().to_string());
        }

        let token = self.refresh(cancel).await?;
        let value = token.expose().to_string();
        tracing::debug!(expires_at = %token.expires_at().as_datetime(), "Access token refreshed");
        *slot = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Effective expiry of the cached token, if any.
    pub async fn expires_at(&self) -> Option<Timestamp> {
        self.token.lock().await.as_ref().map(AccessToken::expires_at)
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<AccessToken, GatewayError> {
        let mut last_failure: Option<TransportFailure> = None;
        let mut retry_count = 0;

        while retry_count <= self.max_retries {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                outcome = self.source.fetch() => outcome,
            };

            match outcome {
                Ok(grant) => return AccessToken::from_grant(&grant, self.clock.now()),
                Err(TokenFetchError::Rejected(reason)) => {
                    tracing::error!(reason = %reason, "Token request rejected");
                    return Err(GatewayError::auth_failed(reason));
                }
                Err(TokenFetchError::Transient(failure)) => {
                    tracing::warn!(
                        attempt = retry_count + 1,
                        error = %failure,
                        "Token request failed"
                    );
                    last_failure = Some(failure);
                }
            }

            if retry_count >= self.max_retries {
                break;
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            retry_count += 1;
        }

        let message = last_failure
            .as_ref()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "no token request attempted".to_string());
        Err(GatewayError::AuthFailed {
            message,
            source: last_failure,
        })
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockClock;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Replays scripted results, repeating the last one when exhausted.
    struct ScriptedSource {
        script: StdMutex<VecDeque<Result<Value, TokenFetchError>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Value, TokenFetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for ScriptedSource {
        async fn fetch(&self) -> Result<Value, TokenFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    fn grant(token: &str) -> Result<Value, TokenFetchError> {
        Ok(json!({"access_token": token, "expires_in": 600}))
    }

    fn network_error() -> Result<Value, TokenFetchError> {
        Err(TokenFetchError::Transient(TransportFailure::connect("connection refused")))
    }

    fn cache(source: Arc<ScriptedSource>) -> (TokenCache, MockClock) {
        let clock = MockClock::at(Timestamp::from_unix_secs(1_700_000_000));
        (TokenCache::with_clock(source, Arc::new(clock.clone())), clock)
    }

    // ══════════════════════════════════════════════════════════════
    // Reuse and Refresh
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reuses_token_within_effective_lifetime() {
        let source = ScriptedSource::new(vec![grant("tok1"), grant("tok2")]);
        let (cache, clock) = cache(source.clone());
        let cancel = CancellationToken::new();

        let first = cache.get_token(&cancel).await.unwrap();
        clock.advance(Duration::from_secs(539));
        let second = cache.get_token(&cancel).await.unwrap();

        assert_eq!(first, "tok1");
        assert_eq!(second, "tok1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn refreshes_after_effective_expiry() {
        let source = ScriptedSource::new(vec![grant("tok1"), grant("tok2")]);
        let (cache, clock) = cache(source.clone());
        let cancel = CancellationToken::new();

        cache.get_token(&cancel).await.unwrap();
        clock.advance(Duration::from_secs(540));
        let refreshed = cache.get_token(&cancel).await.unwrap();

        assert_eq!(refreshed, "tok2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn expiry_is_expires_in_minus_sixty() {
        let source = ScriptedSource::new(vec![grant("tok1")]);
        let (cache, _clock) = cache(source);

        cache.get_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(cache.expires_at().await.unwrap().as_unix_secs(), 1_700_000_540);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let source = ScriptedSource::new(vec![grant("tok1")]);
        let (cache, _clock) = cache(source.clone());
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token(&CancellationToken::new()).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok1");
        }

        assert_eq!(source.calls(), 1);
    }

    // ══════════════════════════════════════════════════════════════
    // Retry and Failure
    // ══════════════════════════════════════════════════════════════

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success_is_retried() {
        let source = ScriptedSource::new(vec![network_error(), grant("tok1")]);
        let (cache, _clock) = cache(source.clone());

        let started = tokio::time::Instant::now();
        let token = cache.get_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(token, "tok1");
        assert_eq!(source.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_raise_auth_failed_with_cause() {
        let source = ScriptedSource::new(vec![network_error()]);
        let (cache, _clock) = cache(source.clone());

        let started = tokio::time::Instant::now();
        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(source.calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4));
        match err {
            GatewayError::AuthFailed { message, source } => {
                assert_eq!(message, "connection refused");
                assert!(source.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_grant_is_not_retried() {
        let source = ScriptedSource::new(vec![Ok(json!({"expires_in": 600}))]);
        let (cache, _clock) = cache(source.clone());

        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, GatewayError::AuthFailed { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn huge_expires_in_fails_without_poisoning_cache() {
        let source =
            ScriptedSource::new(vec![Ok(json!({"access_token": "tok", "expires_in": 1e18}))]);
        let (cache, _clock) = cache(source.clone());

        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, GatewayError::AuthFailed { .. }));
        assert_eq!(source.calls(), 1);
        assert!(cache.expires_at().await.is_none());
    }

    #[tokio::test]
    async fn rejected_request_is_not_retried() {
        let source =
            ScriptedSource::new(vec![Err(TokenFetchError::Rejected("invalid_client".into()))]);
        let (cache, _clock) = cache(source.clone());

        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();

        assert!(err.to_string().contains("invalid_client"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_cache_empty() {
        let source = ScriptedSource::new(vec![Ok(json!({}))]);
        let (cache, _clock) = cache(source);

        let _ = cache.get_token(&CancellationToken::new()).await;

        assert!(cache.expires_at().await.is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Cancellation
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancelled_before_start_makes_no_request() {
        let source = ScriptedSource::new(vec![grant("tok1")]);
        let (cache, _clock) = cache(source.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = cache.get_token(&cancel).await.unwrap_err();

        assert!(matches!(err, GatewayError::Cancelled));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let source = ScriptedSource::new(vec![network_error()]);
        let (cache, _clock) = cache(source.clone());
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            canceller.cancel();
        });

        let err = cache.get_token(&cancel).await.unwrap_err();

        assert!(matches!(err, GatewayError::Cancelled));
        // first attempt, 1s sleep, second attempt, cancelled during the 2s sleep
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refresh() {
        let source = ScriptedSource::new(vec![grant("tok1"), grant("tok2")]);
        let (cache, _clock) = cache(source.clone());
        let cancel = CancellationToken::new();

        cache.get_token(&cancel).await.unwrap();
        cache.invalidate().await;

        assert_eq!(cache.get_token(&cancel).await.unwrap(), "tok2");
    }
}
