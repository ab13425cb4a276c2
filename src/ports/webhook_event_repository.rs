//! WebhookEventRepository port - tracks delivered webhook events.
//!
//! The gateway retries callbacks it believes failed, so the same charge
//! event can arrive more than once. The dispatcher records each event key
//! here and skips keys it has already seen.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Outcome recorded for a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Succeeded,
    Failed,
    Unhandled,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Succeeded => "succeeded",
            WebhookOutcome::Failed => "failed",
            WebhookOutcome::Unhandled => "unhandled",
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Dedup key, `{event}:{id}`.
    pub event_key: String,

    /// Event name, e.g. `charge.completed`.
    pub event_type: String,

    pub processed_at: DateTime<Utc>,

    pub outcome: WebhookOutcome,

    /// Redacted event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn new(
        event_key: impl Into<String>,
        event_type: impl Into<String>,
        outcome: WebhookOutcome,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_key: event_key.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome,
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time this key was seen.
    Inserted,
    /// Another delivery already recorded this key.
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// `save` must be an atomic insert-if-absent so two concurrent deliveries
/// of the same event cannot both see `Inserted`.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_key(&self, event_key: &str)
        -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before `timestamp`, returning how many went.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}
