//! TokenSource port - performs one OAuth client-credentials exchange.
//!
//! The token cache owns retry, backoff and expiry; a source only makes a
//! single attempt and says whether its failure is worth retrying.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::gateway::TransportFailure;

#[derive(Debug, Clone, Error)]
pub enum TokenFetchError {
    /// Network failure or server-side error; the cache retries these.
    #[error("token endpoint unreachable: {0}")]
    Transient(TransportFailure),

    /// The identity provider answered but refused or returned garbage.
    #[error("token request rejected: {0}")]
    Rejected(String),
}

impl TokenFetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenFetchError::Transient(_))
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns the raw JSON grant (`{access_token, expires_in, ...}`).
    async fn fetch(&self) -> Result<Value, TokenFetchError>;
}
