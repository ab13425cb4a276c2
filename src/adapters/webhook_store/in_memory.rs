//! In-memory webhook event store.
//!
//! Suitable for a single process; dedup state is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Webhook event records keyed by dedup key.
#[derive(Debug, Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_key(
        &self,
        event_key: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_key).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_key) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.event_key.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.processed_at >= timestamp);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WebhookOutcome;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    fn record(key: &str) -> WebhookEventRecord {
        WebhookEventRecord::new(key, "charge.completed", WebhookOutcome::Succeeded, json!({}))
    }

    #[tokio::test]
    async fn save_is_insert_if_absent() {
        let repo = InMemoryWebhookEventRepository::new();

        assert_eq!(repo.save(record("charge.completed:1")).await.unwrap(), SaveResult::Inserted);
        assert_eq!(
            repo.save(record("charge.completed:1")).await.unwrap(),
            SaveResult::AlreadyExists
        );
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_key_returns_saved_record() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.save(record("charge.completed:7")).await.unwrap();

        let found = repo.find_by_key("charge.completed:7").await.unwrap().unwrap();
        assert_eq!(found.event_type, "charge.completed");
        assert!(repo.find_by_key("charge.completed:8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_before_removes_only_older_records() {
        let repo = InMemoryWebhookEventRepository::new();
        let mut old = record("old");
        old.processed_at = Utc::now() - Duration::days(2);
        repo.save(old).await.unwrap();
        repo.save(record("fresh")).await.unwrap();

        let deleted = repo.delete_before(Utc::now() - Duration::days(1)).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(repo.find_by_key("fresh").await.unwrap().is_some());
        assert!(repo.find_by_key("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_saves_insert_exactly_once() {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.save(record("charge.completed:99")).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == SaveResult::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
    }
}
