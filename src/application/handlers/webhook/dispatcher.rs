//! WebhookDispatcher - routes admitted callbacks by event name.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::redact;
use crate::domain::webhook::{AdmittedWebhook, WebhookEnvelope, WebhookEventKind};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome};

/// What the dispatcher did with an admitted callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// `charge.completed` / `charge.successful`; carries `data`.
    PaymentSucceeded(Value),
    /// `charge.failed`; carries `data`.
    PaymentFailed(Value),
    /// Any other event; carries the body exactly as received.
    Unhandled(Value),
    /// Already processed under this dedup key; handlers were not re-run.
    Duplicate(String),
}

impl Dispatched {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Dispatched::Duplicate(_))
    }
}

/// Dispatches admitted webhooks, optionally skipping redeliveries.
#[derive(Default)]
pub struct WebhookDispatcher {
    repository: Option<Arc<dyn WebhookEventRepository>>,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables deduplication against `repository`.
    pub fn with_repository(mut self, repository: Arc<dyn WebhookEventRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Parses and routes an admitted webhook.
    ///
    /// Returns `None` when the body is not a JSON object.
    pub async fn process(&self, webhook: AdmittedWebhook) -> Option<Dispatched> {
        let Some(envelope) = WebhookEnvelope::parse(webhook.body()) else {
            tracing::warn!(ip = %webhook.request().source_ip(), "Webhook body is not a JSON object");
            return None;
        };

        tracing::info!(
            event = %envelope.event(),
            payload = %redact(&envelope.to_value()),
            "Webhook received"
        );

        let kind = envelope.kind();
        if let Some(key) = envelope.dedup_key() {
            if self.already_processed(&key, &envelope, kind).await {
                tracing::info!(event_key = %key, "Duplicate webhook delivery skipped");
                return Some(Dispatched::Duplicate(key));
            }
        }

        Some(match kind {
            WebhookEventKind::PaymentSucceeded => self.handle_success(envelope.into_data()),
            WebhookEventKind::PaymentFailed => self.handle_failure(envelope.into_data()),
            WebhookEventKind::Unhandled => {
                tracing::info!(event = %envelope.event(), "Unhandled webhook event");
                Dispatched::Unhandled(envelope.into_value())
            }
        })
    }

    fn handle_success(&self, data: Value) -> Dispatched {
        tracing::info!(
            tx_ref = %field(&data, "tx_ref"),
            transaction_id = %field(&data, "id"),
            amount = %field(&data, "amount"),
            currency = %field(&data, "currency"),
            "Payment successful"
        );
        Dispatched::PaymentSucceeded(data)
    }

    fn handle_failure(&self, data: Value) -> Dispatched {
        tracing::warn!(
            tx_ref = %field(&data, "tx_ref"),
            transaction_id = %field(&data, "id"),
            status = %field(&data, "status"),
            "Payment failed"
        );
        Dispatched::PaymentFailed(data)
    }

    /// Records the delivery, returning true if the key was already stored.
    ///
    /// A store failure is logged and treated as a first delivery.
    async fn already_processed(
        &self,
        key: &str,
        envelope: &WebhookEnvelope,
        kind: WebhookEventKind,
    ) -> bool {
        let Some(repository) = &self.repository else {
            return false;
        };

        let outcome = match kind {
            WebhookEventKind::PaymentSucceeded => WebhookOutcome::Succeeded,
            WebhookEventKind::PaymentFailed => WebhookOutcome::Failed,
            WebhookEventKind::Unhandled => WebhookOutcome::Unhandled,
        };
        let record = WebhookEventRecord::new(
            key,
            envelope.event().to_string(),
            outcome,
            redact(&envelope.to_value()),
        );

        match repository.save(record).await {
            Ok(SaveResult::Inserted) => false,
            Ok(SaveResult::AlreadyExists) => true,
            Err(e) => {
                tracing::warn!(event_key = %key, error = %e, "Failed to record webhook event");
                false
            }
        }
    }
}

fn field(data: &Value, name: &str) -> String {
    match data.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::webhook_store::InMemoryWebhookEventRepository;
    use crate::domain::foundation::DomainError;
    use crate::domain::webhook::WebhookRequest;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn admitted(body: &str) -> AdmittedWebhook {
        AdmittedWebhook::new(WebhookRequest::new(
            "10.0.0.1".parse().unwrap(),
            body.as_bytes().to_vec(),
        ))
    }

    struct FailingRepository;

    #[async_trait]
    impl WebhookEventRepository for FailingRepository {
        async fn find_by_key(
            &self,
            _event_key: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            Err(DomainError::storage("offline"))
        }

        async fn save(&self, _record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
            Err(DomainError::storage("offline"))
        }

        async fn delete_before(&self, _timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
            Err(DomainError::storage("offline"))
        }
    }

    #[tokio::test]
    async fn routes_successful_charges() {
        let dispatcher = WebhookDispatcher::new();

        for event in ["charge.completed", "charge.successful"] {
            let body = format!(r#"{{"event":"{}","data":{{"id":1,"status":"successful"}}}}"#, event);
            assert_eq!(
                dispatcher.process(admitted(&body)).await,
                Some(Dispatched::PaymentSucceeded(json!({"id": 1, "status": "successful"})))
            );
        }
    }

    #[tokio::test]
    async fn routes_failed_charges() {
        let result = WebhookDispatcher::new()
            .process(admitted(r#"{"event":"charge.failed","data":{"id":2}}"#))
            .await;
        assert_eq!(result, Some(Dispatched::PaymentFailed(json!({"id": 2}))));
    }

    #[tokio::test]
    async fn passes_other_events_through_unchanged() {
        let body = json!({
            "event": "transfer.completed",
            "event.type": "Transfer",
            "data": {"id": 3, "amount": 50},
            "meta_data": {"k": 1}
        });
        let result = WebhookDispatcher::new()
            .process(admitted(&body.to_string()))
            .await;

        assert_eq!(result, Some(Dispatched::Unhandled(body)));
    }

    #[tokio::test]
    async fn non_string_event_is_passed_through_as_sent() {
        let body = json!({"event": 12, "data": {"id": 3}});
        let result = WebhookDispatcher::new()
            .process(admitted(&body.to_string()))
            .await;

        assert_eq!(result, Some(Dispatched::Unhandled(body)));
    }

    #[tokio::test]
    async fn non_object_bodies_yield_none() {
        let dispatcher = WebhookDispatcher::new();
        assert_eq!(dispatcher.process(admitted("not json")).await, None);
        assert_eq!(dispatcher.process(admitted("[1,2]")).await, None);
    }

    #[tokio::test]
    async fn redelivery_is_reported_as_duplicate() {
        let repository = Arc::new(InMemoryWebhookEventRepository::new());
        let dispatcher = WebhookDispatcher::new().with_repository(repository.clone());
        let body = r#"{"event":"charge.completed","data":{"id":42,"card":{"token":"flw-t1"}}}"#;

        assert!(matches!(
            dispatcher.process(admitted(body)).await,
            Some(Dispatched::PaymentSucceeded(_))
        ));
        assert_eq!(
            dispatcher.process(admitted(body)).await,
            Some(Dispatched::Duplicate("charge.completed:42".to_string()))
        );

        let record = repository.find_by_key("charge.completed:42").await.unwrap().unwrap();
        assert_eq!(record.outcome, WebhookOutcome::Succeeded);
        assert_eq!(record.payload["data"]["card"]["token"], json!("***REDACTED***"));
    }

    #[tokio::test]
    async fn events_without_identifier_are_never_deduplicated() {
        let repository = Arc::new(InMemoryWebhookEventRepository::new());
        let dispatcher = WebhookDispatcher::new().with_repository(repository.clone());
        let body = r#"{"event":"charge.completed","data":{"amount":10}}"#;

        assert!(!dispatcher.process(admitted(body)).await.unwrap().is_duplicate());
        assert!(!dispatcher.process(admitted(body)).await.unwrap().is_duplicate());
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn store_failure_still_dispatches() {
        let dispatcher = WebhookDispatcher::new().with_repository(Arc::new(FailingRepository));
        let result = dispatcher
            .process(admitted(r#"{"event":"charge.failed","data":{"id":5}}"#))
            .await;
        assert_eq!(result, Some(Dispatched::PaymentFailed(json!({"id": 5}))));
    }
}
